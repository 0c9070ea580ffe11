//! `@@include` template resolver.
//!
//! ```text
//! document  := (text | include | variable | escape)*
//! include   := "@@include" ws* "(" ws* string ws* ("," ws* object ws*)? ")"
//! variable  := "@@" ident
//! escape    := "@@@@"
//! ```
//!
//! Include paths resolve against the resolver base (the source root). The
//! optional JSON object is merged over the caller's context and becomes the
//! variable context of the included file. Unknown variables stay untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use serde_json::{Map, Value};
use thiserror::Error;

/// Maximum include nesting depth.
pub const MAX_DEPTH: usize = 32;

const MARKER: &str = "@@";
const ESCAPE: &str = "@@@@";
const INCLUDE: &str = "include";

/// Variables visible to a template.
pub type Context = Map<String, Value>;

#[derive(Debug, Error)]
pub enum IncludeError {
    #[error("unterminated `@@include` at line {line}")]
    Unterminated { line: usize },

    #[error("expected `(` after `@@include` at line {line}")]
    ExpectedParen { line: usize },

    #[error("expected a quoted include path at line {line}")]
    BadString { line: usize },

    #[error("invalid include context at line {line}: {message}")]
    BadContext { line: usize, message: String },

    #[error("cannot read include `{}`", .path.display())]
    Missing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{}` is not valid UTF-8", .path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("include cycle: {chain}")]
    Cycle { chain: String },

    #[error("includes nested deeper than {MAX_DEPTH} levels at `{}`", .path.display())]
    TooDeep { path: PathBuf },
}

/// Expands `@@` directives relative to a base directory.
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    base: PathBuf,
}

impl IncludeResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Expand `content`, which was read from `origin`.
    ///
    /// `origin` only takes part in cycle detection.
    pub fn expand(&self, content: &str, origin: &Path) -> Result<String, IncludeError> {
        let mut stack = vec![canonical_or_self(origin)];
        self.expand_with(content, &Context::new(), &mut stack)
    }

    fn expand_with(
        &self,
        content: &str,
        ctx: &Context,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String, IncludeError> {
        let mut out = String::with_capacity(content.len());
        let mut pos = 0;

        while let Some(found) = content[pos..].find(MARKER) {
            let start = pos + found;
            out.push_str(&content[pos..start]);

            if content[start..].starts_with(ESCAPE) {
                out.push_str(MARKER);
                pos = start + ESCAPE.len();
                continue;
            }

            let name_start = start + MARKER.len();
            let name_end = ident_end(content, name_start);
            if name_end == name_start {
                out.push_str(MARKER);
                pos = name_start;
                continue;
            }

            let name = &content[name_start..name_end];
            if name == INCLUDE {
                let directive = parse_directive(content, name_end)?;
                let mut child = ctx.clone();
                child.extend(directive.context);
                out.push_str(&self.include(&directive.path, &child, stack)?);
                pos = directive.end;
                continue;
            }

            match lookup(ctx, name) {
                Some((value, len)) => {
                    push_value(&mut out, value);
                    pos = name_start + len;
                }
                None => {
                    out.push_str(&content[start..name_end]);
                    pos = name_end;
                }
            }
        }

        out.push_str(&content[pos..]);
        Ok(out)
    }

    fn include(
        &self,
        rel: &str,
        ctx: &Context,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String, IncludeError> {
        let path = self.base.join(rel);
        if stack.len() > MAX_DEPTH {
            return Err(IncludeError::TooDeep { path });
        }

        let canonical = path.canonicalize().map_err(|source| IncludeError::Missing {
            path: path.clone(),
            source,
        })?;
        if stack.contains(&canonical) {
            let chain = stack
                .iter()
                .chain(std::iter::once(&canonical))
                .map(|p| file_label(p))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(IncludeError::Cycle { chain });
        }

        let bytes = fs::read(&canonical).map_err(|source| IncludeError::Missing {
            path: path.clone(),
            source,
        })?;
        let content = decode(&path, bytes)?;

        stack.push(canonical);
        let result = self.expand_with(&content, ctx, stack);
        stack.pop();
        result
    }
}

/// Template bytes as text; templates must be UTF-8.
pub fn decode(path: &Path, bytes: Vec<u8>) -> Result<String, IncludeError> {
    String::from_utf8(bytes).map_err(|source| IncludeError::Encoding {
        path: path.to_path_buf(),
        source,
    })
}

/// A parsed `@@include(...)` directive.
struct Directive {
    path: String,
    context: Context,
    /// Byte offset just past the closing `)`.
    end: usize,
}

fn parse_directive(src: &str, from: usize) -> Result<Directive, IncludeError> {
    let mut cursor = Cursor { src, pos: from };

    cursor.skip_ws();
    if !cursor.eat('(') {
        return Err(IncludeError::ExpectedParen { line: cursor.line() });
    }

    cursor.skip_ws();
    let path = cursor.string()?;

    cursor.skip_ws();
    let context = if cursor.eat(',') {
        cursor.skip_ws();
        let context = cursor.object()?;
        cursor.skip_ws();
        context
    } else {
        Context::new()
    };

    if !cursor.eat(')') {
        return Err(IncludeError::Unterminated { line: cursor.line() });
    }

    Ok(Directive {
        path,
        context,
        end: cursor.pos,
    })
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn line(&self) -> usize {
        self.src[..self.pos].matches('\n').count() + 1
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
    }

    fn eat(&mut self, c: char) -> bool {
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn string(&mut self) -> Result<String, IncludeError> {
        let line = self.line();
        let quote = match self.rest().chars().next() {
            Some(q @ ('"' | '\'')) => q,
            Some(_) => return Err(IncludeError::BadString { line }),
            None => return Err(IncludeError::Unterminated { line }),
        };
        let body = &self.rest()[1..];
        let Some(len) = body.find(quote) else {
            return Err(IncludeError::BadString { line });
        };
        let value = body[..len].to_string();
        if value.trim().is_empty() {
            return Err(IncludeError::BadString { line });
        }
        self.pos += len + 2;
        Ok(value)
    }

    /// A balanced `{...}` JSON object, honouring strings.
    fn object(&mut self) -> Result<Context, IncludeError> {
        let line = self.line();
        if !self.rest().starts_with('{') {
            return Err(IncludeError::BadContext {
                line,
                message: "expected a JSON object".into(),
            });
        }

        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        let mut end = None;
        for (i, c) in self.rest().char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(i + 1);
                        break;
                    }
                }
                _ => {}
            }
        }

        let Some(len) = end else {
            return Err(IncludeError::Unterminated { line });
        };
        let raw = &self.rest()[..len];
        let context = serde_json::from_str(raw).map_err(|e| IncludeError::BadContext {
            line,
            message: e.to_string(),
        })?;
        self.pos += len;
        Ok(context)
    }
}

/// End offset of an identifier starting at `from` (equal to `from` if none).
fn ident_end(src: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in src[from..].char_indices() {
        let ok = if i == 0 {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
        };
        if !ok {
            break;
        }
        end = from + i + c.len_utf8();
    }
    end
}

/// Resolve `name` in the context, returning the value and how many bytes of
/// `name` it consumed.
///
/// Dotted names walk nested objects. Trailing `.`/`-` are retried without,
/// so `@@title.` at the end of a sentence still resolves.
fn lookup<'c>(ctx: &'c Context, name: &str) -> Option<(&'c Value, usize)> {
    let trimmed = name.trim_end_matches(['.', '-']);
    [name, trimmed]
        .into_iter()
        .filter(|candidate| !candidate.is_empty())
        .find_map(|candidate| resolve(ctx, candidate).map(|v| (v, candidate.len())))
}

fn resolve<'c>(ctx: &'c Context, name: &str) -> Option<&'c Value> {
    if let Some(value) = ctx.get(name) {
        return Some(value);
    }
    let mut parts = name.split('.');
    let first = ctx.get(parts.next()?)?;
    parts.try_fold(first, |value, key| value.get(key))
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}

fn canonical_or_self(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(files: &[(&str, &str)]) -> (TempDir, IncludeResolver) {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let resolver = IncludeResolver::new(dir.path());
        (dir, resolver)
    }

    fn expand(
        dir: &TempDir,
        resolver: &IncludeResolver,
        content: &str,
    ) -> Result<String, IncludeError> {
        resolver.expand(content, &dir.path().join("index.html"))
    }

    #[test]
    fn test_plain_text_unchanged() {
        let (dir, resolver) = setup(&[]);
        let html = "<p>user@example.com</p>";
        assert_eq!(expand(&dir, &resolver, html).unwrap(), html);
    }

    #[test]
    fn test_include_expanded() {
        let (dir, resolver) = setup(&[("partial.html", "<p>hi</p>")]);
        let out = expand(&dir, &resolver, r#"<body>@@include("partial.html")</body>"#).unwrap();
        assert_eq!(out, "<body><p>hi</p></body>");
        assert!(!out.contains("@@include"));
    }

    #[test]
    fn test_single_quotes_and_whitespace() {
        let (dir, resolver) = setup(&[("html/layout/header.html", "<header/>")]);
        let out = expand(&dir, &resolver, "@@include ( 'html/layout/header.html' )").unwrap();
        assert_eq!(out, "<header/>");
    }

    #[test]
    fn test_nested_includes() {
        let (dir, resolver) = setup(&[
            ("html/layout/page.html", "<main>@@include('html/layout/nav.html')</main>"),
            ("html/layout/nav.html", "<nav/>"),
        ]);
        let out = expand(&dir, &resolver, "@@include('html/layout/page.html')").unwrap();
        assert_eq!(out, "<main><nav/></main>");
    }

    #[test]
    fn test_variables() {
        let (dir, resolver) = setup(&[(
            "head.html",
            "<title>@@title</title><meta content=\"@@page.lang\">@@count @@other",
        )]);
        let out = expand(
            &dir,
            &resolver,
            r#"@@include("head.html", {"title": "Home", "page": {"lang": "en"}, "count": 3})"#,
        )
        .unwrap();
        assert_eq!(
            out,
            "<title>Home</title><meta content=\"en\">3 @@other"
        );
    }

    #[test]
    fn test_variable_trailing_dot() {
        let (dir, resolver) = setup(&[("p.html", "Hello @@name.")]);
        let out = expand(&dir, &resolver, r#"@@include("p.html", {"name": "world"})"#).unwrap();
        assert_eq!(out, "Hello world.");
    }

    #[test]
    fn test_context_inherited_and_overridden() {
        let (dir, resolver) = setup(&[
            ("outer.html", r#"@@a/@@include("inner.html", {"b": "B2"})"#),
            ("inner.html", "@@a-@@b"),
        ]);
        let out = expand(
            &dir,
            &resolver,
            r#"@@include("outer.html", {"a": "A", "b": "B"})"#,
        )
        .unwrap();
        assert_eq!(out, "A/A-B2");
    }

    #[test]
    fn test_context_braces_inside_strings() {
        let (dir, resolver) = setup(&[("p.html", "@@x")]);
        let out = expand(&dir, &resolver, r#"@@include("p.html", {"x": "}{"})"#).unwrap();
        assert_eq!(out, "}{");
    }

    #[test]
    fn test_escape() {
        let (dir, resolver) = setup(&[]);
        let out = expand(&dir, &resolver, "@@@@include('x.html')").unwrap();
        assert_eq!(out, "@@include('x.html')");
    }

    #[test]
    fn test_missing_include() {
        let (dir, resolver) = setup(&[]);
        let err = expand(&dir, &resolver, "@@include('nope.html')").unwrap_err();
        assert!(matches!(err, IncludeError::Missing { .. }));
    }

    #[test]
    fn test_non_utf8_include() {
        let (dir, resolver) = setup(&[]);
        fs::write(dir.path().join("latin1.html"), b"caf\xe9").unwrap();
        let err = expand(&dir, &resolver, "@@include('latin1.html')").unwrap_err();
        assert!(matches!(err, IncludeError::Encoding { .. }));
        assert!(err.to_string().contains("latin1.html"));
    }

    #[test]
    fn test_self_cycle() {
        let (dir, resolver) = setup(&[("a.html", "@@include('a.html')")]);
        let err = expand(&dir, &resolver, "@@include('a.html')").unwrap_err();
        assert!(matches!(err, IncludeError::Cycle { .. }));
    }

    #[test]
    fn test_transitive_cycle() {
        let (dir, resolver) = setup(&[
            ("a.html", "@@include('b.html')"),
            ("b.html", "@@include('a.html')"),
        ]);
        let err = expand(&dir, &resolver, "@@include('a.html')").unwrap_err();
        let IncludeError::Cycle { chain } = err else {
            panic!("expected cycle");
        };
        assert!(chain.ends_with("a.html -> b.html -> a.html"));
    }

    #[test]
    fn test_include_same_file_twice_is_not_cycle() {
        let (dir, resolver) = setup(&[("p.html", "x")]);
        let out = expand(&dir, &resolver, "@@include('p.html')@@include('p.html')").unwrap();
        assert_eq!(out, "xx");
    }

    #[test]
    fn test_too_deep() {
        let files: Vec<(String, String)> = (0..=MAX_DEPTH + 1)
            .map(|i| (format!("d{i}.html"), format!("@@include('d{}.html')", i + 1)))
            .collect();
        let files: Vec<(&str, &str)> = files
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        let (dir, resolver) = setup(&files);
        let err = expand(&dir, &resolver, "@@include('d0.html')").unwrap_err();
        assert!(matches!(err, IncludeError::TooDeep { .. }));
    }

    #[test]
    fn test_syntax_errors() {
        let (dir, resolver) = setup(&[("p.html", "")]);
        let cases = [
            ("@@include 'p.html'", "ExpectedParen"),
            ("@@include(p.html)", "BadString"),
            ("@@include('p.html", "BadString"),
            ("@@include('p.html'", "Unterminated"),
            ("@@include('p.html', {\"a\": 1)", "Unterminated"),
            ("@@include('p.html', [1])", "BadContext"),
            ("@@include('p.html', {a: 1})", "BadContext"),
        ];
        for (input, expected) in cases {
            let err = expand(&dir, &resolver, input).unwrap_err();
            assert!(
                format!("{err:?}").starts_with(expected),
                "{input}: got {err:?}"
            );
        }
    }

    #[test]
    fn test_error_line_number() {
        let (dir, resolver) = setup(&[]);
        let err = expand(&dir, &resolver, "a\nb\n@@include(x)").unwrap_err();
        assert_eq!(format!("{err}"), "expected a quoted include path at line 3");
    }
}
