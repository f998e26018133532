use std::fmt;

/// One command line emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `SAY <text>`: text shown to the user.
    Say(String),
    /// `SET <field> <value>`: records a field value.
    Set { field: String, value: String },
    /// `SAVE`: persists the accumulated values.
    Save,
}

impl Directive {
    /// Decodes one line. Blank, unknown and incomplete lines yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();

        if line == "SAVE" {
            return Some(Self::Save);
        }

        if let Some(rest) = keyword_rest(line, "SAY") {
            let text = rest.trim();
            return (!text.is_empty()).then(|| Self::Say(text.to_string()));
        }

        if let Some(rest) = keyword_rest(line, "SET") {
            let rest = rest.trim_start();
            let (field, value) = rest.split_once(char::is_whitespace)?;
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            return Some(Self::Set {
                field: field.to_string(),
                value: value.to_string(),
            });
        }

        None
    }

    /// Encodes the directive back into its line form.
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Say(text) => write!(f, "SAY {text}"),
            Self::Set { field, value } => write!(f, "SET {field} {value}"),
            Self::Save => f.write_str("SAVE"),
        }
    }
}

/// Returns what follows `keyword` when it is followed by whitespace.
fn keyword_rest<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace).then_some(rest)
}

/// Interprets a whole assistant reply, keeping directive order.
pub fn interpret(text: &str) -> Vec<Directive> {
    text.lines().filter_map(Directive::parse_line).collect()
}

/// Joins directives back into reply text, one per line.
pub fn serialize(directives: &[Directive]) -> String {
    directives
        .iter()
        .map(Directive::to_line)
        .collect::<Vec<_>>()
        .join("\n")
}
