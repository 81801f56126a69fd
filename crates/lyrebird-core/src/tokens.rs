//! Token identity and token values.
//!
//! A `TokenType` is a cheap integer handle into a `TokenRegistry`, in the
//! same spirit as an interner symbol: comparing two types is O(1) integer
//! comparison. The registry owns the name and the optional human-readable
//! label of every type. EOF is always present at slot 0.

use serde::{Deserialize, Serialize};

/// A lightweight handle identifying a terminal token type.
///
/// Ordered by registration order, not by name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TokenType(u32);

impl TokenType {
    /// The end-of-input sentinel. Every registry reserves slot 0 for it.
    pub const EOF: TokenType = TokenType(0);

    /// Raw index for serialization/debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Create a TokenType from a raw index. Use only for deserialization.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn is_eof(self) -> bool {
        self.0 == 0
    }
}

/// Registry of terminal token types for one grammar.
///
/// Registering the same name twice returns the existing handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRegistry {
    names: Vec<String>,
    labels: Vec<Option<String>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self {
            names: vec!["EOF".to_owned()],
            labels: vec![Some("<end of input>".to_owned())],
        }
    }

    /// Register a token type, returning its handle.
    pub fn register(&mut self, name: &str) -> TokenType {
        if let Some(existing) = self.lookup(name) {
            return existing;
        }
        let tt = TokenType(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.labels.push(None);
        tt
    }

    /// Register a token type with a display label used in error messages.
    pub fn register_with_label(&mut self, name: &str, label: &str) -> TokenType {
        let tt = self.register(name);
        self.labels[tt.0 as usize] = Some(label.to_owned());
        tt
    }

    /// Find a previously registered type by name.
    pub fn lookup(&self, name: &str) -> Option<TokenType> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| TokenType(i as u32))
    }

    /// The registered name of a type.
    ///
    /// # Panics
    /// Panics if the handle was not created by this registry.
    #[inline]
    pub fn name(&self, tt: TokenType) -> &str {
        &self.names[tt.0 as usize]
    }

    /// The display label of a type, falling back to its name.
    #[inline]
    pub fn label(&self, tt: TokenType) -> &str {
        match &self.labels[tt.0 as usize] {
            Some(label) => label,
            None => &self.names[tt.0 as usize],
        }
    }

    /// Number of registered types, EOF included.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false // EOF is always present
    }

    /// Iterate over all registered types with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (TokenType, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (TokenType(i as u32), n.as_str()))
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A single token produced by the (external) lexer.
///
/// Position fields are optional: the engine never requires them, it only
/// threads them through into error reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub image: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
    #[serde(default)]
    pub start_offset: Option<u32>,
    #[serde(default)]
    pub end_offset: Option<u32>,
    /// True for tokens fabricated by single-token insertion recovery.
    #[serde(default)]
    pub inserted: bool,
}

impl Token {
    pub fn new(token_type: TokenType, image: impl Into<String>) -> Self {
        Self {
            token_type,
            image: image.into(),
            line: None,
            column: None,
            start_offset: None,
            end_offset: None,
            inserted: false,
        }
    }

    /// Attach byte offsets.
    pub fn with_span(mut self, start: u32, end: u32) -> Self {
        self.start_offset = Some(start);
        self.end_offset = Some(end);
        self
    }

    /// Attach a line/column position.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// The end-of-input sentinel token.
    pub fn eof() -> Self {
        Self::new(TokenType::EOF, "")
    }

    /// A token fabricated by error recovery in place of missing input.
    pub fn invented(token_type: TokenType) -> Self {
        let mut tok = Self::new(token_type, "");
        tok.inserted = true;
        tok
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.token_type.is_eof()
    }
}
