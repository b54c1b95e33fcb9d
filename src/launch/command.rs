// src/launch/command.rs

use std::fmt;

/// Ordered argv of one launcher invocation.
///
/// The first token is the launcher binary; the rest are passed verbatim as
/// its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    tokens: Vec<String>,
}

impl LaunchCommand {
    pub(crate) fn from_tokens(tokens: Vec<String>) -> Self {
        debug_assert!(!tokens.is_empty(), "launch command needs a program");
        Self { tokens }
    }

    /// Build a command from an arbitrary argv (used for the compile step).
    ///
    /// Returns `None` for an empty argv.
    pub fn from_argv<I, S>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = argv.into_iter().map(Into::into).collect();
        if tokens.is_empty() {
            None
        } else {
            Some(Self { tokens })
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    /// Position of the first occurrence of `token`, if any.
    pub fn position_of(&self, token: &str) -> Option<usize> {
        self.tokens.iter().position(|t| t == token)
    }
}

/// Space-joined rendering for humans; tokens containing whitespace or
/// quotes are single-quoted so the line can be pasted into a shell.
impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&shell_quote(token))?;
        }
        Ok(())
    }
}

pub(crate) fn shell_quote(token: &str) -> String {
    let needs_quotes = token.is_empty()
        || token
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '$' | '`' | '\\' | ';' | '&' | '|'));
    if needs_quotes {
        format!("'{}'", token.replace('\'', r"'\''"))
    } else {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_only_when_needed() {
        let cmd = LaunchCommand::from_argv(["java", "-Dname=two words", "Main"]).unwrap();
        assert_eq!(cmd.to_string(), "java '-Dname=two words' Main");
        assert_eq!(cmd.program(), "java");
        assert_eq!(cmd.args().len(), 2);
    }

    #[test]
    fn empty_argv_is_rejected() {
        assert!(LaunchCommand::from_argv(Vec::<String>::new()).is_none());
    }
}
