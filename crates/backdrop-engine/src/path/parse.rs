use crate::coords::Vec2;

/// Paths with fewer points than this cannot be stroked and are discarded.
pub const MIN_DRAWABLE_POINTS: usize = 2;

// ── Scanner ───────────────────────────────────────────────────────────────

/// Commands whose arguments are coordinate pairs.
fn takes_pairs(cmd: char) -> bool {
    matches!(cmd.to_ascii_uppercase(), 'M' | 'L' | 'C' | 'S' | 'Q' | 'T')
}

fn is_junk(c: char) -> bool {
    !(c.is_whitespace() || c == ',' || c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.'))
}

struct Scanner<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Scanner<'s> {
    fn new(src: &'s str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace() || c == ',') {
            self.advance();
        }
    }

    /// Scans one numeric token.
    ///
    /// A sign only starts a token, and a second `.` ends it, so compact forms
    /// such as `1-2` or `.5.5` split into two numbers. Returns `None` for a
    /// token that does not parse or is not finite; the characters are consumed
    /// either way.
    fn number(&mut self) -> Option<f32> {
        let start = self.pos;
        let mut seen_dot = false;
        let mut seen_exp = false;

        if matches!(self.peek(), Some('-' | '+')) {
            self.advance();
        }

        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {}
                '.' if !seen_dot && !seen_exp => seen_dot = true,
                'e' | 'E' if !seen_exp => {
                    seen_exp = true;
                    self.advance();
                    if matches!(self.peek(), Some('-' | '+')) {
                        self.advance();
                    }
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        let text = &self.src[start..self.pos];
        text.parse::<f32>().ok().filter(|v| v.is_finite())
    }
}

// ── Parser ────────────────────────────────────────────────────────────────

/// Parses a path description into its coordinate pairs, in encounter order.
///
/// Every pair following a pair-taking command letter (`M L C S Q T`, either
/// case) becomes one point. A malformed or non-finite number invalidates only
/// its own pair, and a dangling odd number is dropped. Arguments of other
/// commands (`H V A Z`) and unknown characters are ignored. Never fails.
pub fn parse_path(description: &str) -> Vec<Vec2> {
    let mut points = Vec::new();
    let mut scanner = Scanner::new(description);
    let mut command: Option<char> = None;
    let mut pending: Vec<Option<f32>> = Vec::new();

    let mut flush = |command: Option<char>, pending: &mut Vec<Option<f32>>| {
        if command.is_some_and(takes_pairs) {
            for pair in pending.chunks_exact(2) {
                if let [Some(x), Some(y)] = pair {
                    points.push(Vec2::new(*x, *y));
                }
            }
        }
        pending.clear();
    };

    // End offset of the most recent numeric token, to detect junk glued to it.
    let mut last_number_end = None;

    loop {
        scanner.skip_separators();
        let Some(ch) = scanner.peek() else { break };

        match ch {
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                pending.push(scanner.number());
                last_number_end = Some(scanner.pos);
            }
            c if c.is_ascii_alphabetic() => {
                flush(command, &mut pending);
                command = Some(c);
                scanner.advance();
            }
            _ => {
                // Junk glued to a number poisons that number; free-standing
                // junk counts as one malformed token.
                let glued = last_number_end == Some(scanner.pos);
                while matches!(scanner.peek(), Some(c) if is_junk(c)) {
                    scanner.advance();
                }
                match pending.last_mut() {
                    Some(last) if glued => *last = None,
                    _ => pending.push(None),
                }
            }
        }
    }
    flush(command, &mut pending);

    points
}

/// A set of parsed, drawable paths.
///
/// Degenerate paths (fewer than [`MIN_DRAWABLE_POINTS`] points) are dropped
/// at parse time, so every stored path can be stroked. Each kept path
/// remembers its position in the input, so per-path parameters derived from
/// that position do not shift when an earlier path is dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathSet {
    paths: Vec<(usize, Vec<Vec2>)>,
}

impl PathSet {
    pub fn parse_all<'a>(descriptions: impl IntoIterator<Item = &'a str>) -> Self {
        let mut paths = Vec::new();
        for (i, d) in descriptions.into_iter().enumerate() {
            let points = parse_path(d);
            if points.len() < MIN_DRAWABLE_POINTS {
                log::debug!("path {i} has {} point(s); discarded as degenerate", points.len());
                continue;
            }
            paths.push((i, points));
        }
        Self { paths }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Kept paths with their input index.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Vec2])> {
        self.paths.iter().map(|(i, points)| (*i, points.as_slice()))
    }

    /// The `index`-th kept path (not the input index).
    #[inline]
    pub fn get(&self, index: usize) -> Option<&[Vec2]> {
        self.paths.get(index).map(|(_, points)| points.as_slice())
    }

    /// Releases the parsed points.
    pub fn clear(&mut self) {
        self.paths.clear();
    }
}
