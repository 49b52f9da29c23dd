//! tree-sitter frontend for Go, JavaScript, TypeScript and Python.

use tree_sitter::{Node, Parser, Tree};

use super::{group_comments, Language, LineIndex};
use crate::error::ParseError;
use crate::syntax::{NodeKind, ParsedFile, SourceNode};

/// How one grammar's node kinds map onto the tracked statement kinds.
struct Grammar {
    /// Tried in order; the first grammar that parses without errors wins.
    loaders: &'static [fn() -> tree_sitter::Language],
    functions: &'static [&'static str],
    assignments: &'static [&'static str],
    conditionals: &'static [&'static str],
    returns: &'static [&'static str],
    expr_stmts: &'static [&'static str],
    identifiers: &'static [&'static str],
    strings: &'static [&'static str],
}

fn go() -> tree_sitter::Language {
    tree_sitter_go::LANGUAGE.into()
}

fn javascript() -> tree_sitter::Language {
    tree_sitter_javascript::LANGUAGE.into()
}

fn typescript() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

fn tsx() -> tree_sitter::Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

fn python() -> tree_sitter::Language {
    tree_sitter_python::LANGUAGE.into()
}

static GO: Grammar = Grammar {
    loaders: &[go],
    functions: &["function_declaration", "method_declaration"],
    assignments: &["assignment_statement", "short_var_declaration"],
    conditionals: &["if_statement"],
    returns: &["return_statement"],
    expr_stmts: &["expression_statement"],
    identifiers: &[
        "identifier",
        "field_identifier",
        "package_identifier",
        "type_identifier",
    ],
    strings: &["interpreted_string_literal", "raw_string_literal"],
};

const JS_IDENTIFIERS: &[&str] = &[
    "identifier",
    "property_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
    "private_property_identifier",
    "type_identifier",
];

const JAVASCRIPT: Grammar = Grammar {
    loaders: &[javascript],
    functions: &[
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
    ],
    assignments: &[
        "assignment_expression",
        "augmented_assignment_expression",
        "lexical_declaration",
        "variable_declaration",
    ],
    conditionals: &["if_statement"],
    returns: &["return_statement"],
    expr_stmts: &["expression_statement"],
    identifiers: JS_IDENTIFIERS,
    strings: &["string", "template_string"],
};

static TYPESCRIPT: Grammar = Grammar {
    loaders: &[typescript, tsx],
    ..JAVASCRIPT
};

static PYTHON: Grammar = Grammar {
    loaders: &[python],
    functions: &["function_definition"],
    assignments: &["assignment", "augmented_assignment"],
    conditionals: &["if_statement"],
    returns: &["return_statement"],
    expr_stmts: &["expression_statement"],
    identifiers: &["identifier"],
    strings: &["string"],
};

impl Grammar {
    fn for_language(language: Language) -> Option<&'static Grammar> {
        match language {
            Language::Go => Some(&GO),
            Language::JavaScript => Some(&JAVASCRIPT),
            Language::TypeScript => Some(&TYPESCRIPT),
            Language::Python => Some(&PYTHON),
            Language::Rust => None,
        }
    }

    fn statement_kind(&self, kind: &str) -> NodeKind {
        if self.functions.contains(&kind) {
            NodeKind::Function
        } else if self.assignments.contains(&kind) {
            NodeKind::Assignment
        } else if self.conditionals.contains(&kind) {
            NodeKind::Conditional
        } else if self.returns.contains(&kind) {
            NodeKind::Return
        } else if self.expr_stmts.contains(&kind) {
            NodeKind::ExprStmt
        } else {
            NodeKind::Other
        }
    }
}

pub(super) fn parse(language: Language, text: &str) -> Result<ParsedFile, ParseError> {
    let grammar = Grammar::for_language(language).ok_or_else(|| ParseError::Grammar {
        language,
        message: "no tree-sitter grammar registered".into(),
    })?;
    let tree = parse_tree(language, grammar, text)?;

    let mut lowering = Lowering {
        grammar,
        src: text,
        comments: Vec::new(),
    };
    let root = lowering
        .lower(tree.root_node())
        .unwrap_or_else(|| SourceNode::new(NodeKind::Other, 1));

    let index = LineIndex::new(text);
    let comments = lowering
        .comments
        .into_iter()
        .map(|(start, end)| index.record(start, end))
        .collect();

    Ok(ParsedFile {
        root,
        comments: group_comments(text, comments),
        syntax: language.comment_syntax(),
    })
}

fn parse_tree(language: Language, grammar: &Grammar, text: &str) -> Result<Tree, ParseError> {
    let mut first_error = None;
    for load in grammar.loaders {
        let mut parser = Parser::new();
        parser
            .set_language(&load())
            .map_err(|err| ParseError::Grammar {
                language,
                message: err.to_string(),
            })?;
        let Some(tree) = parser.parse(text, None) else {
            continue;
        };
        if !tree.root_node().has_error() {
            return Ok(tree);
        }
        if first_error.is_none() {
            let (line, column) = first_error_position(tree.root_node());
            first_error = Some(ParseError::Syntax {
                language,
                line,
                column,
            });
        }
    }
    Err(first_error.unwrap_or(ParseError::Grammar {
        language,
        message: "parser produced no tree".into(),
    }))
}

fn first_error_position(node: Node<'_>) -> (usize, usize) {
    if node.is_error() || node.is_missing() {
        let pos = node.start_position();
        return (pos.row + 1, pos.column + 1);
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.has_error() {
                return first_error_position(child);
            }
        }
    }
    let pos = node.start_position();
    (pos.row + 1, pos.column + 1)
}

struct Lowering<'a> {
    grammar: &'a Grammar,
    src: &'a str,
    comments: Vec<(usize, usize)>,
}

impl Lowering<'_> {
    fn lower(&mut self, node: Node<'_>) -> Option<SourceNode> {
        if !node.is_named() {
            return None;
        }
        let kind = node.kind();
        let line = node.start_position().row + 1;
        if kind == "comment" {
            self.comments.push((node.start_byte(), node.end_byte()));
            return None;
        }
        if self.grammar.identifiers.contains(&kind) {
            return Some(SourceNode::ident(self.text(node), line));
        }
        if self.grammar.strings.contains(&kind) {
            return Some(SourceNode::string(self.text(node), line));
        }

        let mut lowered = SourceNode::new(self.grammar.statement_kind(kind), line);
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                if let Some(child) = self.lower(child) {
                    lowered.children.push(child);
                }
            }
        }
        Some(lowered)
    }

    fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.src.as_bytes()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::LineAnchorIndex;

    fn kinds_by_line(language: Language, src: &str) -> Vec<(usize, NodeKind)> {
        let parsed = parse(language, src).unwrap();
        let index = LineAnchorIndex::build(&parsed.root);
        (1..=src.lines().count())
            .filter_map(|line| index.get(line).map(|n| (line, n.kind.clone())))
            .collect()
    }

    #[test]
    fn go_statements() {
        let src = "package a\n\nfunc main() {\n\terr := connect()\n\tif err != nil {\n\t\treturn\n\t}\n\tlog.Println(\"done\")\n}\n";
        assert_eq!(
            kinds_by_line(Language::Go, src),
            vec![
                (3, NodeKind::Function),
                (4, NodeKind::Assignment),
                (5, NodeKind::Conditional),
                (6, NodeKind::Return),
                (8, NodeKind::ExprStmt),
            ]
        );
    }

    #[test]
    fn javascript_statements() {
        let src = "function load() {\n  const cfg = readConfig();\n  cfg.count += 1;\n  if (!cfg) {\n    return null;\n  }\n  console.log('loaded');\n}\n";
        assert_eq!(
            kinds_by_line(Language::JavaScript, src),
            vec![
                (1, NodeKind::Function),
                (2, NodeKind::Assignment),
                (3, NodeKind::Assignment),
                (4, NodeKind::Conditional),
                (5, NodeKind::Return),
                (7, NodeKind::ExprStmt),
            ]
        );
    }

    #[test]
    fn typescript_falls_back_to_tsx() {
        let src = "const view = (name: string) => <div>{name}</div>;\n";
        let parsed = parse(Language::TypeScript, src).unwrap();
        let index = LineAnchorIndex::build(&parsed.root);
        assert_eq!(index.get(1).map(|n| n.kind.clone()), Some(NodeKind::Assignment));
    }

    #[test]
    fn python_statements_and_comments() {
        let src = "def load_config(path):\n    # read the config file\n    data = read_file(path)\n    return data  # return data\n";
        let parsed = parse(Language::Python, src).unwrap();
        assert_eq!(parsed.comment_count(), 2);
        assert_eq!(parsed.comments.len(), 2);
        assert_eq!(parsed.comments[0].comments[0].text, "# read the config file");
        assert_eq!(parsed.comments[1].comments[0].line, 4);
        assert_eq!(
            kinds_by_line(Language::Python, src),
            vec![
                (1, NodeKind::Function),
                (3, NodeKind::Assignment),
                (4, NodeKind::Return),
            ]
        );
    }

    #[test]
    fn broken_source_is_an_error() {
        let err = parse(Language::Go, "package a\nfunc (\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { language: Language::Go, .. }), "{err:?}");
    }
}
