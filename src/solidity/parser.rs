use super::lexer::{tokenize, Token};
use super::types::{elementary_size, enum_byte_width, Field, FieldKind, Record};
use crate::error::{SslcError, SslcResult};
use crate::layout::SLOT_CAPACITY;
use std::collections::HashMap;
use tracing::debug;

const CONTRACT_SIZE: u8 = 20;

#[derive(Debug, Clone)]
struct RawStruct {
    name: String,
    container: Option<String>,
    line: usize,
    members: Vec<Vec<Token>>,
}

/// Every type-level declaration found in one source file.
#[derive(Debug, Default)]
struct Declarations {
    structs: Vec<RawStruct>,
    enums: HashMap<String, u64>,
    value_types: HashMap<String, String>,
    contracts: Vec<String>,
}

impl Declarations {
    fn is_struct(&self, name: &str) -> bool {
        self.structs.iter().any(|s| s.name == name)
    }

    fn is_contract(&self, name: &str) -> bool {
        self.contracts.iter().any(|c| c == name)
    }
}

struct Scanner<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Scanner<'t> {
    fn peek_ident(&self, offset: usize) -> Option<&'t str> {
        self.tokens.get(self.pos + offset).and_then(|t| t.ident())
    }

    fn peek_punct(&self, offset: usize, c: char) -> bool {
        self.tokens
            .get(self.pos + offset)
            .is_some_and(|t| t.is_punct(c))
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map(|t| t.line).unwrap_or(1)
    }

    /// Collects `;`-separated member token lists up to the closing brace.
    /// Expects `pos` on the opening brace.
    fn read_struct_body(&mut self, name: &str) -> SslcResult<Vec<Vec<Token>>> {
        let tokens = self.tokens;
        self.pos += 1;
        let mut members = Vec::new();
        let mut current = Vec::new();
        let mut nesting = 0usize;

        while let Some(token) = tokens.get(self.pos) {
            self.pos += 1;
            if token.is_punct('{') {
                nesting += 1;
            } else if token.is_punct('}') {
                if nesting == 0 {
                    if !current.is_empty() {
                        return Err(SslcError::Parse {
                            line: token.line,
                            message: format!("missing ';' after last member of struct '{}'", name),
                        });
                    }
                    return Ok(members);
                }
                nesting -= 1;
            } else if token.is_punct(';') && nesting == 0 {
                if !current.is_empty() {
                    members.push(std::mem::take(&mut current));
                }
                continue;
            }
            current.push(token.clone());
        }

        Err(SslcError::Parse {
            line: self.last_line(),
            message: format!("unexpected end of input inside struct '{}'", name),
        })
    }

    /// Counts enum members up to the closing brace. Expects `pos` on the opening brace.
    fn read_enum_body(&mut self, name: &str) -> SslcResult<u64> {
        let tokens = self.tokens;
        self.pos += 1;
        let mut members = 0u64;
        while let Some(token) = tokens.get(self.pos) {
            self.pos += 1;
            if token.is_punct('}') {
                return Ok(members);
            }
            if token.ident().is_some() {
                members += 1;
            }
        }
        Err(SslcError::Parse {
            line: self.last_line(),
            message: format!("unexpected end of input inside enum '{}'", name),
        })
    }

    fn scan(mut self) -> SslcResult<Declarations> {
        let tokens = self.tokens;
        let mut decls = Declarations::default();
        let mut containers: Vec<(String, usize)> = Vec::new();
        let mut pending_container: Option<String> = None;
        let mut depth = 0usize;

        while let Some(token) = tokens.get(self.pos) {
            let after_dot = self.pos > 0 && tokens[self.pos - 1].is_punct('.');

            match token.ident() {
                Some("contract" | "library" | "interface") if !after_dot => {
                    if let Some(name) = self.peek_ident(1) {
                        decls.contracts.push(name.to_string());
                        pending_container = Some(name.to_string());
                        self.pos += 2;
                        continue;
                    }
                }
                Some("struct") if self.peek_punct(2, '{') => {
                    if let Some(name) = self.peek_ident(1) {
                        let line = token.line;
                        self.pos += 2;
                        let members = self.read_struct_body(name)?;
                        decls.structs.push(RawStruct {
                            name: name.to_string(),
                            container: containers.last().map(|(c, _)| c.clone()),
                            line,
                            members,
                        });
                        continue;
                    }
                }
                Some("enum") if self.peek_punct(2, '{') => {
                    if let Some(name) = self.peek_ident(1) {
                        self.pos += 2;
                        let members = self.read_enum_body(name)?;
                        decls.enums.insert(name.to_string(), members);
                        continue;
                    }
                }
                Some("type") if self.peek_ident(2) == Some("is") => {
                    if let (Some(name), Some(underlying)) = (self.peek_ident(1), self.peek_ident(3)) {
                        decls
                            .value_types
                            .insert(name.to_string(), underlying.to_string());
                        self.pos += 4;
                        continue;
                    }
                }
                _ => {}
            }

            if token.is_punct('{') {
                depth += 1;
                if let Some(name) = pending_container.take() {
                    containers.push((name, depth));
                }
            } else if token.is_punct('}') {
                if depth == 0 {
                    return Err(SslcError::Parse {
                        line: token.line,
                        message: "unbalanced '}'".to_string(),
                    });
                }
                if containers.last().is_some_and(|(_, d)| *d == depth) {
                    containers.pop();
                }
                depth -= 1;
            }
            self.pos += 1;
        }

        if depth != 0 {
            return Err(SslcError::Parse {
                line: self.last_line(),
                message: "unexpected end of input: unclosed '{'".to_string(),
            });
        }
        Ok(decls)
    }
}

fn declaration_text(lines: &[&str], line: usize) -> String {
    let raw = lines.get(line.saturating_sub(1)).copied().unwrap_or("");
    let without_comment = match raw.find("//") {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    without_comment.trim().to_string()
}

fn normalize_elementary(name: &str) -> String {
    match name {
        "uint" => "uint256".to_string(),
        "int" => "int256".to_string(),
        other => other.to_string(),
    }
}

fn resolve_member(
    record: &str,
    tokens: &[Token],
    decls: &Declarations,
    lines: &[&str],
) -> SslcResult<Field> {
    let line = tokens.first().map(|t| t.line).unwrap_or(0);
    let parse_error = |message: String| SslcError::Parse { line, message };

    let (name_token, type_tokens) = match tokens.split_last() {
        Some((last, rest)) if !rest.is_empty() => (last, rest),
        _ => {
            return Err(parse_error(format!(
                "malformed member declaration in struct '{}'",
                record
            )))
        }
    };
    let name = name_token
        .ident()
        .ok_or_else(|| parse_error(format!("expected member name in struct '{}'", record)))?
        .to_string();
    let declaration = declaration_text(lines, line);
    let unsupported = |type_name: String| SslcError::UnsupportedFieldKind {
        record: record.to_string(),
        member: name.clone(),
        type_name,
        line,
    };

    let head = type_tokens[0]
        .ident()
        .ok_or_else(|| parse_error(format!("expected a type for member '{}'", name)))?;

    if head == "mapping" {
        return Ok(Field {
            name,
            byte_size: SLOT_CAPACITY as u8,
            line,
            kind: FieldKind::Mapping,
            type_name: None,
            declaration,
        });
    }
    if head == "function" {
        return Err(unsupported("function".to_string()));
    }

    // Qualified path `A.B.C`, optionally followed by `payable`
    let mut segments = vec![head];
    let mut idx = 1;
    while idx + 1 < type_tokens.len() && type_tokens[idx].is_punct('.') {
        let segment = type_tokens[idx + 1]
            .ident()
            .ok_or_else(|| parse_error(format!("malformed type path for member '{}'", name)))?;
        segments.push(segment);
        idx += 2;
    }
    if head == "address" && type_tokens.get(idx).is_some_and(|t| t.is_ident("payable")) {
        idx += 1;
    }

    let rest = &type_tokens[idx..];
    if let Some(first) = rest.first() {
        if first.is_punct('[') {
            return Ok(Field {
                name,
                byte_size: SLOT_CAPACITY as u8,
                line,
                kind: FieldKind::Array,
                type_name: None,
                declaration,
            });
        }
        return Err(parse_error(format!(
            "unexpected token in type of member '{}' of struct '{}'",
            name, record
        )));
    }

    let base = segments[segments.len() - 1];
    let (kind, byte_size, type_name) = if segments.len() == 1 && elementary_size(base).is_some() {
        let size = elementary_size(base).unwrap_or(SLOT_CAPACITY as u8);
        (FieldKind::Elementary, size, normalize_elementary(base))
    } else if let Some(&members) = decls.enums.get(base) {
        (FieldKind::Enum, enum_byte_width(base, members)?, base.to_string())
    } else if let Some(underlying) = decls.value_types.get(base) {
        let size = elementary_size(underlying).ok_or_else(|| unsupported(underlying.clone()))?;
        (FieldKind::Elementary, size, base.to_string())
    } else if decls.is_struct(base) {
        (FieldKind::Struct, SLOT_CAPACITY as u8, base.to_string())
    } else if decls.is_contract(base) {
        (FieldKind::Contract, CONTRACT_SIZE, base.to_string())
    } else {
        return Err(unsupported(segments.join(".")));
    };

    Ok(Field {
        name,
        byte_size,
        line,
        kind,
        type_name: Some(type_name),
        declaration,
    })
}

/// Extracts every struct of a Solidity source file with sized members.
///
/// With `only_last`, only structs declared inside the last contract, library
/// or interface of the file are returned.
pub fn extract_records(source: &str, only_last: bool) -> SslcResult<Vec<Record>> {
    let tokens = tokenize(source)?;
    let decls = Scanner {
        tokens: &tokens,
        pos: 0,
    }
    .scan()?;
    let lines: Vec<&str> = source.lines().collect();

    let last_contract = decls.contracts.last().cloned();
    let mut records = Vec::new();

    for raw in &decls.structs {
        if only_last && (last_contract.is_none() || raw.container != last_contract) {
            continue;
        }

        let fields = raw
            .members
            .iter()
            .map(|member| resolve_member(&raw.name, member, &decls, &lines))
            .collect::<SslcResult<Vec<Field>>>()?;

        debug!(
            "struct {} ({} members, container {:?})",
            raw.name,
            fields.len(),
            raw.container
        );
        records.push(Record {
            name: raw.name.clone(),
            container: raw.container.clone(),
            line: raw.line,
            fields,
        });
    }

    Ok(records)
}
