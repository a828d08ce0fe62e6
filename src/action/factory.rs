// ActionFactory - name to constructor registry for the command-string interface

use std::collections::HashMap;
use std::sync::Mutex;

use crate::action::trait_def::ActionHandle;

/// Errors produced while resolving a command string
#[derive(Debug, Clone, thiserror::Error)]
pub enum FactoryError {
    #[error("Empty command")]
    EmptyCommand,
    #[error("Unterminated quote in command")]
    UnterminatedQuote,
    #[error("Unknown action '{0}'")]
    UnknownAction(String),
    #[error("{message}")]
    Parse { message: String, usage: String },
}

impl FactoryError {
    /// Usage text for the action the command named, when known.
    pub fn usage(&self) -> Option<&str> {
        match self {
            FactoryError::Parse { usage, .. } => Some(usage),
            _ => None,
        }
    }
}

type Builder = Box<dyn Fn(&[String]) -> Result<ActionHandle, String> + Send + Sync>;

struct FactoryEntry {
    usage: String,
    builder: Builder,
}

/// Registry resolving textual commands (`name arg1 arg2 ...`) into actions.
///
/// Action names are matched case-insensitively. An invalid command never
/// produces an action; the caller reports the error plus the usage string
/// through its context and performs no dispatch.
pub struct ActionFactory {
    entries: Mutex<HashMap<String, FactoryEntry>>,
}

impl ActionFactory {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Register a builder for `name`. The builder receives the argument
    /// tokens and returns either an action or a parse-error message.
    pub fn register(
        &self,
        name: &str,
        usage: &str,
        builder: impl Fn(&[String]) -> Result<ActionHandle, String> + Send + Sync + 'static,
    ) {
        let mut entries = self.entries.lock().expect("factory poisoned");
        entries.insert(
            name.to_lowercase(),
            FactoryEntry {
                usage: usage.to_string(),
                builder: Box::new(builder),
            },
        );
    }

    /// Resolve a command string into an action.
    pub fn create(&self, command: &str) -> Result<ActionHandle, FactoryError> {
        let tokens = tokenize(command)?;
        let Some((name, arguments)) = tokens.split_first() else {
            return Err(FactoryError::EmptyCommand);
        };

        let entries = self.entries.lock().expect("factory poisoned");
        let entry = entries
            .get(&name.to_lowercase())
            .ok_or_else(|| FactoryError::UnknownAction(name.clone()))?;

        (entry.builder)(arguments).map_err(|message| FactoryError::Parse {
            message,
            usage: entry.usage.clone(),
        })
    }

    /// Registered action names, sorted.
    pub fn action_names(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("factory poisoned");
        let mut names: Vec<String> = entries.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ActionFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a command into tokens. Double-quoted tokens may contain spaces;
/// quotes themselves are stripped.
fn tokenize(command: &str) -> Result<Vec<String>, FactoryError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut had_quotes = false;

    for character in command.chars() {
        match character {
            '"' => {
                in_quotes = !in_quotes;
                had_quotes = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || had_quotes {
                    tokens.push(std::mem::take(&mut current));
                    had_quotes = false;
                }
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err(FactoryError::UnterminatedQuote);
    }
    if !current.is_empty() || had_quotes {
        tokens.push(current);
    }

    Ok(tokens)
}

/// Quote an argument for the command-string form when it needs it.
pub fn quote_argument(argument: &str) -> String {
    if argument.is_empty() || argument.chars().any(char::is_whitespace) {
        format!("\"{argument}\"")
    } else {
        argument.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain_and_quoted() {
        let tokens = tokenize(r#"set layer_1:name "Left Atrium""#).unwrap();
        assert_eq!(tokens, vec!["set", "layer_1:name", "Left Atrium"]);
    }

    #[test]
    fn test_tokenize_empty_quoted_argument() {
        let tokens = tokenize(r#"set layer_1:name """#).unwrap();
        assert_eq!(tokens, vec!["set", "layer_1:name", ""]);
    }

    #[test]
    fn test_tokenize_unterminated_quote() {
        assert!(matches!(
            tokenize(r#"set name "half"#),
            Err(FactoryError::UnterminatedQuote)
        ));
    }

    #[test]
    fn test_unknown_action() {
        let factory = ActionFactory::new();
        assert!(matches!(
            factory.create("levitate now"),
            Err(FactoryError::UnknownAction(name)) if name == "levitate"
        ));
    }

    #[test]
    fn test_empty_command() {
        let factory = ActionFactory::new();
        assert!(matches!(factory.create("   "), Err(FactoryError::EmptyCommand)));
    }

    #[test]
    fn test_parse_error_carries_usage() {
        let factory = ActionFactory::new();
        factory.register("noop", "noop", |args| {
            if args.is_empty() {
                Err("this builder always fails".to_string())
            } else {
                Err("too many arguments".to_string())
            }
        });

        let error = factory.create("noop").err().unwrap();
        assert_eq!(error.usage(), Some("noop"));
        assert!(error.to_string().contains("always fails"));
    }

    #[test]
    fn test_quote_argument() {
        assert_eq!(quote_argument("plain"), "plain");
        assert_eq!(quote_argument("two words"), "\"two words\"");
        assert_eq!(quote_argument(""), "\"\"");
    }
}
