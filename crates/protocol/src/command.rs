use std::fmt;

/// Protocol extension answered by the proxy itself.
pub const GENMOVELOG_COMMAND: &str = "sabaki-genmovelog";

/// One GTP request: `[id] name [args...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: Option<u32>,
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: Option<u32>) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Parses one client line.
    ///
    /// Comments (`#` to end of line) and control characters are dropped, tabs count as
    /// spaces. Returns `None` when nothing but whitespace is left.
    pub fn parse(line: &str) -> Option<Self> {
        let cleaned = preprocess(line);
        let mut tokens = cleaned.split_whitespace();
        let first = tokens.next()?;

        let (id, name) = if first.bytes().all(|b| b.is_ascii_digit()) {
            match first.parse::<u32>() {
                Ok(id) => (Some(id), tokens.next().unwrap_or_default()),
                Err(_) => (None, first),
            }
        } else {
            (None, first)
        };

        Some(Self {
            id,
            name: name.to_string(),
            args: tokens.map(str::to_string).collect(),
        })
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

fn preprocess(line: &str) -> String {
    let line = line.split_once('#').map_or(line, |(head, _)| head);
    line.chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = self.id {
            write!(f, "{id} ")?;
        }
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
