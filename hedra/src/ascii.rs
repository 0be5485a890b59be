//! Whitespace-token scanning shared by the `ascii_load` implementations.

use anyhow::{anyhow, bail, Context, Result};
use hedra_num::Coefficient;
use std::str::FromStr;

/// A whitespace-separated token stream over loader input.
#[derive(Debug)]
pub struct Tokens<'a> {
    it: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            it: input.split_whitespace(),
        }
    }

    /// The next token, failing at end of input.
    pub fn next_token(&mut self) -> Result<&'a str> {
        self.it.next().ok_or_else(|| anyhow!("unexpected end of input"))
    }

    /// Consumes a token that must equal `expected`.
    pub fn expect(&mut self, expected: &str) -> Result<()> {
        let tok = self.next_token()?;
        if tok != expected {
            bail!("expected `{expected}`, found `{tok}`");
        }
        Ok(())
    }

    /// Consumes and parses the next token.
    pub fn parse<T>(&mut self) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let tok = self.next_token()?;
        tok.parse::<T>()
            .with_context(|| format!("cannot parse `{tok}`"))
    }

    /// Consumes and parses the next token as a coefficient.
    pub fn coefficient(&mut self) -> Result<Coefficient> {
        let tok = self.next_token()?;
        Coefficient::from_str(tok).with_context(|| format!("cannot parse coefficient `{tok}`"))
    }

    /// Whether the stream is exhausted.
    pub fn at_end(&mut self) -> bool {
        self.it.clone().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanning() {
        let mut t = Tokens::new("space_dim 3 -12\n next");
        t.expect("space_dim").unwrap();
        assert_eq!(t.parse::<usize>().unwrap(), 3);
        assert_eq!(t.coefficient().unwrap(), Coefficient::from(-12));
        assert!(!t.at_end());
        assert_eq!(t.next_token().unwrap(), "next");
        assert!(t.at_end());
        assert!(t.next_token().is_err());
    }

    #[test]
    fn mismatched_tokens_fail() {
        let mut t = Tokens::new("gen_sys");
        assert!(t.expect("con_sys").is_err());
    }
}
