use shared::NONE;

/// Heap letters in board order
pub const HEAP_NAMES: [char; 3] = ['A', 'B', 'C'];

/// What a line typed by the player asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move { heap: i16, count: i16 },
    Quit,
}

impl Command {
    /// Sent for anything that is not a well-formed move so the server
    /// answers it as illegal
    pub const INVALID: Command = Command::Move {
        heap: NONE,
        count: NONE,
    };
}

/// Parses `"<A|B|C> <positive count>"` or `"Q"`.
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line == "Q" {
        return Command::Quit;
    }

    let mut tokens = line.split_whitespace();
    let (Some(heap), Some(count), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Command::INVALID;
    };

    let heap = match heap {
        "A" => 0,
        "B" => 1,
        "C" => 2,
        _ => return Command::INVALID,
    };

    if !count.bytes().all(|b| b.is_ascii_digit()) {
        return Command::INVALID;
    }
    match count.parse::<i16>() {
        Ok(count) if count > 0 => Command::Move { heap, count },
        _ => Command::INVALID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_moves() {
        assert_eq!(parse_command("A 3"), Command::Move { heap: 0, count: 3 });
        assert_eq!(parse_command("B 1"), Command::Move { heap: 1, count: 1 });
        assert_eq!(parse_command("  C   12 \n"), Command::Move { heap: 2, count: 12 });
    }

    #[test]
    fn test_parse_quit() {
        assert_eq!(parse_command("Q"), Command::Quit);
        assert_eq!(parse_command("Q\n"), Command::Quit);
    }

    #[test]
    fn test_malformed_lines_become_invalid_move() {
        for line in ["", "A", "a 1", "D 1", "A 0", "A -1", "A +1", "A x", "A 1 2", "A 99999", "q"] {
            assert_eq!(parse_command(line), Command::INVALID, "line {:?}", line);
        }
    }
}
