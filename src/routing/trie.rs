//! The route trie: method-rooted, segment-keyed, with typed segments.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

use crate::error::RouteConflict;

/// HTTP methods a route may be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl RouteMethod {
    /// Parse a method name. Anything outside the supported set is a
    /// registration-time error.
    pub fn parse(name: &str) -> Result<Self, RouteConflict> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            other => Err(RouteConflict::UnsupportedMethod(other.to_string())),
        }
    }

    /// Map an inbound request method. `None` means the method key cannot
    /// exist in the trie, so the request falls to the not-found default.
    pub fn from_http(method: &axum::http::Method) -> Option<Self> {
        match *method {
            axum::http::Method::GET => Some(Self::Get),
            axum::http::Method::POST => Some(Self::Post),
            axum::http::Method::PUT => Some(Self::Put),
            axum::http::Method::DELETE => Some(Self::Delete),
            axum::http::Method::PATCH => Some(Self::Patch),
            _ => None,
        }
    }

    /// Whether requests with this method carry a JSON body to collect.
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

/// Variable bindings extracted during a match, keyed by the name the route
/// declared. Built fresh per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(HashMap<String, String>);

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn insert(&mut self, name: String, value: String) {
        self.0.insert(name, value);
    }
}

/// Strip exactly one leading and one trailing slash, making `/x/`, `/x` and
/// `x` the same route key.
pub fn normalize(path: &str) -> &str {
    let p = path.strip_prefix('/').unwrap_or(path);
    p.strip_suffix('/').unwrap_or(p)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarKind {
    /// `:name` — matches exactly one segment.
    Single,
    /// `::name` — matches the entire remainder; must end the route.
    Greedy,
}

/// The single variable-kind child a level may carry.
#[derive(Debug)]
struct VarChild<T> {
    kind: VarKind,
    name: String,
    node: Box<Node<T>>,
}

#[derive(Debug)]
struct Node<T> {
    literals: HashMap<String, Node<T>>,
    variable: Option<VarChild<T>>,
    terminal: Option<T>,
}

impl<T> Node<T> {
    fn new() -> Self {
        Self {
            literals: HashMap::new(),
            variable: None,
            terminal: None,
        }
    }
}

#[derive(Debug)]
enum Segment {
    Literal(String),
    Single(String),
    Greedy(String),
}

impl Segment {
    fn parse(raw: &str) -> Result<Self, RouteConflict> {
        if let Some(name) = raw.strip_prefix("::") {
            validate_segment_text(name)?;
            Ok(Self::Greedy(name.to_string()))
        } else if let Some(name) = raw.strip_prefix(':') {
            validate_segment_text(name)?;
            Ok(Self::Single(name.to_string()))
        } else {
            validate_segment_text(raw)?;
            Ok(Self::Literal(raw.to_string()))
        }
    }
}

fn validate_segment_text(text: &str) -> Result<(), RouteConflict> {
    let valid = !text.is_empty()
        && text.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || !c.is_ascii()
                || matches!(
                    c,
                    '-' | '.' | '_' | '~' | '%' | '!' | '$' | '&' | '\'' | '(' | ')' | '*'
                        | '+' | ',' | ';' | '=' | ':' | '@'
                )
        });
    if valid {
        Ok(())
    } else {
        Err(RouteConflict::InvalidSegment(text.to_string()))
    }
}

fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn split_segments(normalized: &str) -> Vec<&str> {
    if normalized.is_empty() {
        Vec::new()
    } else {
        normalized.split('/').collect()
    }
}

/// A trie over URL-path segments, rooted per HTTP method.
///
/// Built once at configuration time; read-only while serving.
#[derive(Debug)]
pub struct RouteTrie<T> {
    roots: HashMap<RouteMethod, Node<T>>,
}

impl<T> Default for RouteTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTrie<T> {
    pub fn new() -> Self {
        Self {
            roots: HashMap::new(),
        }
    }

    /// Insert a terminal under `method` + `path`.
    ///
    /// The last registration for an identical exact path+method silently
    /// replaces the previous terminal. Conflicting shapes (variable-name
    /// clashes, non-final greedy segments, invalid characters) are rejected
    /// before any node is created.
    pub fn register(
        &mut self,
        method: RouteMethod,
        path: &str,
        terminal: T,
    ) -> Result<(), RouteConflict> {
        let raw_segments = split_segments(normalize(path));
        let segments: Vec<Segment> = raw_segments
            .iter()
            .map(|s| Segment::parse(s))
            .collect::<Result<_, _>>()?;
        if let Some(pos) = segments
            .iter()
            .position(|s| matches!(s, Segment::Greedy(_)))
        {
            if pos + 1 != segments.len() {
                let name = match &segments[pos] {
                    Segment::Greedy(name) => name.clone(),
                    _ => String::new(),
                };
                return Err(RouteConflict::GreedyNotLast { name });
            }
        }

        let mut node = self.roots.entry(method).or_insert_with(Node::new);
        for segment in segments {
            node = match segment {
                Segment::Literal(text) => node.literals.entry(text).or_insert_with(Node::new),
                Segment::Single(name) => Self::variable_child(node, VarKind::Single, name)?,
                Segment::Greedy(name) => Self::variable_child(node, VarKind::Greedy, name)?,
            };
        }
        node.terminal = Some(terminal);
        Ok(())
    }

    fn variable_child(
        node: &mut Node<T>,
        kind: VarKind,
        name: String,
    ) -> Result<&mut Node<T>, RouteConflict> {
        let slot = node.variable.get_or_insert_with(|| VarChild {
            kind,
            name: name.clone(),
            node: Box::new(Node::new()),
        });
        if slot.kind != kind || slot.name != name {
            return Err(RouteConflict::VariableNameClash {
                existing: slot.name.clone(),
                new: name,
            });
        }
        Ok(&mut *slot.node)
    }

    /// Resolve a request path to its terminal and extracted variables.
    ///
    /// Matching is structural: literal children win over the variable child
    /// at every level, with backtracking into the variable branch when a
    /// literal subtree dead-ends. A greedy child consumes the remainder
    /// (including an empty remainder, which binds `""`).
    pub fn find(&self, method: RouteMethod, path: &str) -> Option<(&T, RouteParams)> {
        let segments = split_segments(normalize(path));
        let root = self.roots.get(&method)?;
        let mut params = RouteParams::default();
        Self::walk(root, &segments, &mut params).map(|terminal| (terminal, params))
    }

    fn walk<'t>(
        node: &'t Node<T>,
        segments: &[&str],
        params: &mut RouteParams,
    ) -> Option<&'t T> {
        let Some((head, rest)) = segments.split_first() else {
            if let Some(terminal) = node.terminal.as_ref() {
                return Some(terminal);
            }
            if let Some(var) = &node.variable {
                if var.kind == VarKind::Greedy {
                    if let Some(terminal) = var.node.terminal.as_ref() {
                        params.insert(var.name.clone(), String::new());
                        return Some(terminal);
                    }
                }
            }
            return None;
        };

        if let Some(child) = node.literals.get(*head) {
            if let Some(terminal) = Self::walk(child, rest, params) {
                return Some(terminal);
            }
        }

        if let Some(var) = &node.variable {
            match var.kind {
                VarKind::Single => {
                    if let Some(terminal) = Self::walk(&var.node, rest, params) {
                        params.insert(var.name.clone(), decode_segment(head));
                        return Some(terminal);
                    }
                }
                VarKind::Greedy => {
                    if let Some(terminal) = var.node.terminal.as_ref() {
                        let joined = segments
                            .iter()
                            .map(|s| decode_segment(s))
                            .collect::<Vec<_>>()
                            .join("/");
                        params.insert(var.name.clone(), joined);
                        return Some(terminal);
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie() -> RouteTrie<&'static str> {
        RouteTrie::new()
    }

    #[test]
    fn test_normalize_strips_one_slash_each_side() {
        assert_eq!(normalize("/two/"), "two");
        assert_eq!(normalize("/two"), "two");
        assert_eq!(normalize("two"), "two");
        assert_eq!(normalize("/"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_registered_route_matches_all_slash_forms() {
        let mut t = trie();
        t.register(RouteMethod::Get, "two", "h").unwrap();

        for path in ["/two", "two", "/two/", "two/"] {
            let (terminal, params) = t.find(RouteMethod::Get, path).unwrap();
            assert_eq!(*terminal, "h");
            assert!(params.is_empty());
        }
        assert!(t.find(RouteMethod::Post, "/two").is_none());
    }

    #[test]
    fn test_root_route() {
        let mut t = trie();
        t.register(RouteMethod::Get, "/", "root").unwrap();
        let (terminal, _) = t.find(RouteMethod::Get, "/").unwrap();
        assert_eq!(*terminal, "root");
    }

    #[test]
    fn test_literal_beats_variable_sibling() {
        let mut t = trie();
        t.register(RouteMethod::Get, "users/me", "literal").unwrap();
        t.register(RouteMethod::Get, "users/:id", "variable").unwrap();

        let (terminal, params) = t.find(RouteMethod::Get, "/users/me").unwrap();
        assert_eq!(*terminal, "literal");
        assert!(params.is_empty());

        let (terminal, params) = t.find(RouteMethod::Get, "/users/42").unwrap();
        assert_eq!(*terminal, "variable");
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_backtracks_out_of_dead_end_literal() {
        let mut t = trie();
        t.register(RouteMethod::Get, "users/me/settings", "literal").unwrap();
        t.register(RouteMethod::Get, "users/:id/files", "variable").unwrap();

        // "me" enters the literal subtree first, which has no /files leaf;
        // the walk must back out and take the variable branch.
        let (terminal, params) = t.find(RouteMethod::Get, "/users/me/files").unwrap();
        assert_eq!(*terminal, "variable");
        assert_eq!(params.get("id"), Some("me"));
    }

    #[test]
    fn test_mid_path_node_without_terminal_is_not_a_match() {
        let mut t = trie();
        t.register(RouteMethod::Get, "users/:userId", "a").unwrap();
        t.register(RouteMethod::Get, "users/:userId/products/:productId", "b")
            .unwrap();

        assert!(t.find(RouteMethod::Get, "/users/abc/products").is_none());
        assert!(t.find(RouteMethod::Get, "/users/abc").is_some());
        assert!(t.find(RouteMethod::Get, "/users/abc/products/def").is_some());
    }

    #[test]
    fn test_variable_value_is_percent_decoded() {
        let mut t = trie();
        t.register(RouteMethod::Get, "files/:name", "h").unwrap();
        let (_, params) = t
            .find(RouteMethod::Get, "/files/%C3%A9toile.txt")
            .unwrap();
        assert_eq!(params.get("name"), Some("étoile.txt"));
    }

    #[test]
    fn test_greedy_consumes_remainder_decoded_per_segment() {
        let mut t = trie();
        t.register(RouteMethod::Get, "::filePath", "h").unwrap();

        let (_, params) = t.find(RouteMethod::Get, "/a%2Fb/c").unwrap();
        assert_eq!(params.get("filePath"), Some("a/b/c"));

        let (_, params) = t.find(RouteMethod::Get, "/%C3%A9toile.txt").unwrap();
        assert_eq!(params.get("filePath"), Some("étoile.txt"));
    }

    #[test]
    fn test_greedy_matches_empty_remainder() {
        let mut t = trie();
        t.register(RouteMethod::Get, "::path", "h").unwrap();
        let (_, params) = t.find(RouteMethod::Get, "/").unwrap();
        assert_eq!(params.get("path"), Some(""));
    }

    #[test]
    fn test_greedy_under_prefix() {
        let mut t = trie();
        t.register(RouteMethod::Get, "assets/::path", "h").unwrap();
        let (_, params) = t.find(RouteMethod::Get, "/assets/css/site.css").unwrap();
        assert_eq!(params.get("path"), Some("css/site.css"));
        assert!(t.find(RouteMethod::Get, "/other/site.css").is_none());
    }

    #[test]
    fn test_variable_sibling_name_clash_is_rejected() {
        let mut t = trie();
        t.register(RouteMethod::Get, "users/:a", "h").unwrap();
        let err = t.register(RouteMethod::Get, "users/:b/x", "h").unwrap_err();
        assert_eq!(
            err,
            RouteConflict::VariableNameClash {
                existing: "a".into(),
                new: "b".into(),
            }
        );

        // Kind mismatch at the same level is a clash too.
        let err = t.register(RouteMethod::Get, "users/::a", "h").unwrap_err();
        assert!(matches!(err, RouteConflict::VariableNameClash { .. }));
    }

    #[test]
    fn test_same_variable_name_extends_without_conflict() {
        let mut t = trie();
        t.register(RouteMethod::Get, "users/:id", "a").unwrap();
        t.register(RouteMethod::Get, "users/:id/posts", "b").unwrap();
        assert!(t.find(RouteMethod::Get, "/users/7/posts").is_some());
    }

    #[test]
    fn test_greedy_must_be_final() {
        let mut t = trie();
        let err = t.register(RouteMethod::Get, "::rest/tail", "h").unwrap_err();
        assert_eq!(err, RouteConflict::GreedyNotLast { name: "rest".into() });
    }

    #[test]
    fn test_invalid_segment_characters_rejected() {
        let mut t = trie();
        assert!(matches!(
            t.register(RouteMethod::Get, "bad segment", "h").unwrap_err(),
            RouteConflict::InvalidSegment(_)
        ));
        assert!(matches!(
            t.register(RouteMethod::Get, "a//b", "h").unwrap_err(),
            RouteConflict::InvalidSegment(_)
        ));
        assert!(matches!(
            t.register(RouteMethod::Get, "x/:", "h").unwrap_err(),
            RouteConflict::InvalidSegment(_)
        ));
    }

    #[test]
    fn test_last_registration_wins_for_identical_route() {
        let mut t = trie();
        t.register(RouteMethod::Get, "/x", "first").unwrap();
        t.register(RouteMethod::Get, "x/", "second").unwrap();
        let (terminal, _) = t.find(RouteMethod::Get, "/x").unwrap();
        assert_eq!(*terminal, "second");
    }

    #[test]
    fn test_unsupported_method_parse() {
        assert!(matches!(
            RouteMethod::parse("TRACE").unwrap_err(),
            RouteConflict::UnsupportedMethod(_)
        ));
        assert_eq!(RouteMethod::parse("get").unwrap(), RouteMethod::Get);
    }
}
