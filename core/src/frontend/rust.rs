//! Rust frontend: `syn` for the tree, a small lexer for the comments `syn` drops.

use proc_macro2::{Delimiter, TokenStream, TokenTree};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};

use super::{group_comments, LineIndex};
use crate::error::ParseError;
use crate::syntax::{CommentSyntax, NodeKind, ParsedFile, SourceNode};

/// Words that can appear as bare idents inside macro invocations but never
/// name anything.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

pub(super) fn parse(text: &str) -> Result<ParsedFile, ParseError> {
    let file = syn::parse_file(text).map_err(|err| {
        let start = err.span().start();
        ParseError::Rust {
            line: start.line,
            column: start.column + 1,
            message: err.to_string(),
        }
    })?;

    let mut lowering = Lowering::new();
    lowering.visit_file(&file);
    let root = lowering.finish();

    let index = LineIndex::new(text);
    let comments = scan_comments(text)
        .into_iter()
        .map(|(start, end)| index.record(start, end))
        .collect();

    Ok(ParsedFile {
        root,
        comments: group_comments(text, comments),
        syntax: CommentSyntax::C_LIKE,
    })
}

/// Builds the [`SourceNode`] tree while `syn` walks the file.
struct Lowering {
    stack: Vec<SourceNode>,
}

impl Lowering {
    fn new() -> Self {
        Self {
            stack: vec![SourceNode::new(NodeKind::Other, 1)],
        }
    }

    fn within(&mut self, kind: NodeKind, line: usize, body: impl FnOnce(&mut Self)) {
        self.stack.push(SourceNode::new(kind, line));
        body(self);
        if self.stack.len() > 1 {
            if let Some(node) = self.stack.pop() {
                self.attach(node);
            }
        }
    }

    fn attach(&mut self, node: SourceNode) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
        }
    }

    fn ident(&mut self, name: String, line: usize) {
        if matches!(name.as_str(), "self" | "Self" | "crate" | "super") {
            return;
        }
        self.attach(SourceNode::ident(name, line));
    }

    fn finish(mut self) -> SourceNode {
        while self.stack.len() > 1 {
            if let Some(node) = self.stack.pop() {
                self.attach(node);
            }
        }
        self.stack
            .pop()
            .unwrap_or_else(|| SourceNode::new(NodeKind::Other, 1))
    }

    /// Macro bodies are opaque to `syn`; pull names and strings out of the tokens.
    fn macro_tokens(&mut self, tokens: TokenStream) {
        let mut iter = tokens.into_iter().peekable();
        while let Some(tree) = iter.next() {
            match tree {
                TokenTree::Ident(ident) => {
                    let name = ident.to_string();
                    if !KEYWORDS.contains(&name.as_str()) {
                        self.ident(name, ident.span().start().line);
                    }
                }
                TokenTree::Literal(literal) => {
                    let line = literal.span().start().line;
                    if let syn::Lit::Str(lit) = syn::Lit::new(literal) {
                        self.attach(SourceNode::string(lit.value(), line));
                    }
                }
                TokenTree::Punct(punct) => {
                    // `#[doc = "..."]` and other attributes inside macro input.
                    if punct.as_char() == '#' {
                        if let Some(TokenTree::Group(group)) = iter.peek() {
                            if group.delimiter() == Delimiter::Bracket {
                                iter.next();
                            }
                        }
                    }
                }
                TokenTree::Group(group) => self.macro_tokens(group.stream()),
            }
        }
    }
}

fn line_of<T: Spanned>(node: &T) -> usize {
    node.span().start().line
}

fn is_compound_assign(op: &syn::BinOp) -> bool {
    matches!(
        op,
        syn::BinOp::AddAssign(_)
            | syn::BinOp::SubAssign(_)
            | syn::BinOp::MulAssign(_)
            | syn::BinOp::DivAssign(_)
            | syn::BinOp::RemAssign(_)
            | syn::BinOp::BitXorAssign(_)
            | syn::BinOp::BitAndAssign(_)
            | syn::BinOp::BitOrAssign(_)
            | syn::BinOp::ShlAssign(_)
            | syn::BinOp::ShrAssign(_)
    )
}

/// Loops, blocks and `match` are control structure, not expression statements.
fn is_expression_statement(expr: &syn::Expr) -> bool {
    !matches!(
        expr,
        syn::Expr::ForLoop(_)
            | syn::Expr::While(_)
            | syn::Expr::Loop(_)
            | syn::Expr::Block(_)
            | syn::Expr::Match(_)
            | syn::Expr::Unsafe(_)
            | syn::Expr::TryBlock(_)
            | syn::Expr::Const(_)
    )
}

impl<'ast> Visit<'ast> for Lowering {
    // Doc comments arrive as attributes; they are comments, not code.
    fn visit_attribute(&mut self, _: &'ast syn::Attribute) {}

    fn visit_item_fn(&mut self, i: &'ast syn::ItemFn) {
        let line = i.sig.fn_token.span.start().line;
        self.within(NodeKind::Function, line, |v| visit::visit_item_fn(v, i));
    }

    fn visit_impl_item_fn(&mut self, i: &'ast syn::ImplItemFn) {
        let line = i.sig.fn_token.span.start().line;
        self.within(NodeKind::Function, line, |v| visit::visit_impl_item_fn(v, i));
    }

    fn visit_trait_item_fn(&mut self, i: &'ast syn::TraitItemFn) {
        let line = i.sig.fn_token.span.start().line;
        self.within(NodeKind::Function, line, |v| visit::visit_trait_item_fn(v, i));
    }

    fn visit_local(&mut self, i: &'ast syn::Local) {
        let line = i.let_token.span.start().line;
        self.within(NodeKind::Assignment, line, |v| visit::visit_local(v, i));
    }

    fn visit_expr_assign(&mut self, i: &'ast syn::ExprAssign) {
        let line = line_of(&i.left);
        self.within(NodeKind::Assignment, line, |v| visit::visit_expr_assign(v, i));
    }

    fn visit_expr_binary(&mut self, i: &'ast syn::ExprBinary) {
        if is_compound_assign(&i.op) {
            let line = line_of(&i.left);
            self.within(NodeKind::Assignment, line, |v| visit::visit_expr_binary(v, i));
        } else {
            visit::visit_expr_binary(self, i);
        }
    }

    fn visit_expr_if(&mut self, i: &'ast syn::ExprIf) {
        let line = i.if_token.span.start().line;
        self.within(NodeKind::Conditional, line, |v| visit::visit_expr_if(v, i));
    }

    fn visit_expr_return(&mut self, i: &'ast syn::ExprReturn) {
        let line = i.return_token.span.start().line;
        self.within(NodeKind::Return, line, |v| visit::visit_expr_return(v, i));
    }

    fn visit_stmt(&mut self, i: &'ast syn::Stmt) {
        match i {
            syn::Stmt::Expr(expr, _) if is_expression_statement(expr) => {
                self.within(NodeKind::ExprStmt, line_of(expr), |v| visit::visit_stmt(v, i));
            }
            syn::Stmt::Macro(mac) => {
                self.within(NodeKind::ExprStmt, line_of(&mac.mac.path), |v| {
                    visit::visit_stmt(v, i)
                });
            }
            _ => visit::visit_stmt(self, i),
        }
    }

    fn visit_macro(&mut self, i: &'ast syn::Macro) {
        visit::visit_macro(self, i);
        self.macro_tokens(i.tokens.clone());
    }

    fn visit_ident(&mut self, i: &'ast proc_macro2::Ident) {
        self.ident(i.unraw().to_string(), i.span().start().line);
    }

    fn visit_lit_str(&mut self, i: &'ast syn::LitStr) {
        self.attach(SourceNode::string(i.value(), i.span().start().line));
    }
}

/// Byte ranges of every `//` and `/* */` comment, skipping anything inside
/// string, raw string and char literals.
fn scan_comments(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let mut end = text[i..].find('\n').map_or(text.len(), |n| i + n);
                if end > i && bytes[end - 1] == b'\r' {
                    end -= 1;
                }
                spans.push((i, end));
                i = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let end = block_comment_end(bytes, i);
                spans.push((i, end));
                i = end;
            }
            b'"' => i = string_end(bytes, i + 1),
            b'r' | b'b' | b'c' if !continues_ident(bytes, i) => {
                i = raw_string_end(bytes, i).unwrap_or(i + 1);
            }
            b'\'' => i = char_literal_end(text, i).unwrap_or(i + 1),
            _ => i += 1,
        }
    }
    spans
}

fn continues_ident(bytes: &[u8], i: usize) -> bool {
    i > 0 && {
        let prev = bytes[i - 1];
        prev.is_ascii_alphanumeric() || prev == b'_' || prev >= 0x80
    }
}

/// Block comments nest in Rust.
fn block_comment_end(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut j = start;
    while j + 1 < bytes.len() {
        match (bytes[j], bytes[j + 1]) {
            (b'/', b'*') => {
                depth += 1;
                j += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                j += 2;
                if depth == 0 {
                    return j;
                }
            }
            _ => j += 1,
        }
    }
    bytes.len()
}

fn string_end(bytes: &[u8], mut j: usize) -> usize {
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'"' => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

/// End of `r"…"`, `r#"…"#`, `br"…"` or `cr"…"` starting at `i`, if there is one.
fn raw_string_end(bytes: &[u8], i: usize) -> Option<usize> {
    let mut j = i;
    if matches!(bytes[j], b'b' | b'c') {
        j += 1;
    }
    if bytes.get(j) != Some(&b'r') {
        return None;
    }
    j += 1;
    let hashes = bytes[j..].iter().take_while(|&&b| b == b'#').count();
    j += hashes;
    if bytes.get(j) != Some(&b'"') {
        return None;
    }
    j += 1;
    while j < bytes.len() {
        if bytes[j] == b'"'
            && bytes
                .get(j + 1..j + 1 + hashes)
                .is_some_and(|tail| tail.iter().all(|&b| b == b'#'))
        {
            return Some(j + 1 + hashes);
        }
        j += 1;
    }
    Some(bytes.len())
}

/// End of a char literal starting at `i`, or `None` for a lifetime or label.
fn char_literal_end(text: &str, i: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    match bytes.get(i + 1)? {
        b'\\' => {
            let mut j = i + 3;
            while j < bytes.len() && bytes[j] != b'\'' && bytes[j] != b'\n' {
                j += 1;
            }
            (bytes.get(j) == Some(&b'\'')).then_some(j + 1)
        }
        _ => {
            let ch = text[i + 1..].chars().next()?;
            let after = i + 1 + ch.len_utf8();
            (bytes.get(after) == Some(&b'\'')).then_some(after + 1)
        }
    }
}
