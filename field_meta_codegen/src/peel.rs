//! Metadata chains and the value peeler.
//!
//! A field's metadata is written after its type as `| a | b | c`. The chain
//! is held right-associated: a cons node whose head is the outermost layer and
//! whose tail is the rest. Each annotation application peels exactly one
//! layer, so successive channels see the layers in declaration order.

use proc_macro2::{TokenStream, TokenTree};
use quote::{ToTokens, TokenStreamExt};
use syn::parse::ParseStream;
use syn::{Expr, Token};

/// One `| value` element of a metadata chain.
#[derive(Debug, Clone)]
pub enum Layer {
    /// `_`: defer to the channel default.
    UseDefault(Token![_]),
    /// An explicit value expression.
    Value(Expr),
}

impl Layer {
    /// Parses the tokens of a single layer.
    fn from_tokens(tokens: TokenStream) -> syn::Result<Self> {
        if let Ok(marker) = syn::parse2::<Token![_]>(tokens.clone()) {
            return Ok(Self::UseDefault(marker));
        }
        syn::parse2::<Expr>(tokens).map(Self::Value)
    }

    /// Consumes tokens up to the next top-level `|` or `,`.
    fn parse_one(input: ParseStream) -> syn::Result<Self> {
        let tokens = input.step(|cursor| {
            let mut rest = *cursor;
            let mut collected = TokenStream::new();
            while let Some((tt, next)) = rest.token_tree() {
                if let TokenTree::Punct(punct) = &tt
                    && matches!(punct.as_char(), '|' | ',')
                {
                    break;
                }
                collected.append(tt);
                rest = next;
            }
            Ok((collected, rest))
        })?;
        if tokens.is_empty() {
            return Err(input.error("expected a metadata value"));
        }
        Self::from_tokens(tokens)
    }
}

impl ToTokens for Layer {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        match self {
            Self::UseDefault(marker) => marker.to_tokens(tokens),
            Self::Value(expr) => expr.to_tokens(tokens),
        }
    }
}

/// A right-associated chain of metadata layers.
#[derive(Debug, Clone, Default)]
pub enum MetaChain {
    /// No layers left.
    #[default]
    Empty,
    /// The outermost layer and the remaining chain.
    Cons {
        /// Outermost layer.
        head: Layer,
        /// Remaining layers.
        tail: Box<MetaChain>,
    },
}

impl MetaChain {
    /// Builds a chain whose head is the first layer given.
    #[must_use]
    pub fn from_layers(layers: Vec<Layer>) -> Self {
        layers
            .into_iter()
            .rev()
            .fold(Self::Empty, |tail, head| Self::Cons {
                head,
                tail: Box::new(tail),
            })
    }

    /// Splits off the outermost layer.
    ///
    /// Returns `None` as the layer when the chain is exhausted; the remainder
    /// of an exhausted chain is again empty.
    ///
    /// ```
    /// use field_meta_codegen::{Layer, MetaChain};
    ///
    /// let chain = MetaChain::from_layers(vec![
    ///     Layer::Value(syn::parse_quote!("X")),
    ///     Layer::Value(syn::parse_quote!("cm")),
    /// ]);
    /// let (first, rest) = chain.peel();
    /// assert!(matches!(first, Some(Layer::Value(_))));
    /// assert_eq!(rest.len(), 1);
    /// ```
    #[must_use]
    pub fn peel(self) -> (Option<Layer>, Self) {
        match self {
            Self::Empty => (None, Self::Empty),
            Self::Cons { head, tail } => (Some(head), *tail),
        }
    }

    /// Whether no layers remain.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Number of remaining layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers().count()
    }

    /// Iterates the layers from outermost to innermost.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        let mut current = self;
        std::iter::from_fn(move || match current {
            Self::Empty => None,
            Self::Cons { head, tail } => {
                current = tail;
                Some(head)
            }
        })
    }

    /// Parses `| a | b ...` following a field type; no leading pipe means an
    /// empty chain.
    pub(crate) fn parse_piped(input: ParseStream) -> syn::Result<Self> {
        let mut layers = Vec::new();
        while input.peek(Token![|]) {
            input.parse::<Token![|]>()?;
            layers.push(Layer::parse_one(input)?);
        }
        Ok(Self::from_layers(layers))
    }

    /// Parses `a | b ...` where the first layer has no leading pipe.
    pub(crate) fn parse_bare(input: ParseStream) -> syn::Result<Self> {
        let mut layers = vec![Layer::parse_one(input)?];
        while input.peek(Token![|]) {
            input.parse::<Token![|]>()?;
            layers.push(Layer::parse_one(input)?);
        }
        Ok(Self::from_layers(layers))
    }
}

impl ToTokens for MetaChain {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        for layer in self.layers() {
            <Token![|]>::default().to_tokens(tokens);
            layer.to_tokens(tokens);
        }
    }
}
