//! Source-text queries used by the manifest-to-implementation checks.

use crate::pattern::comment_free_lines;
use camino::Utf8Path;
use fs_err as fs;
use glob::glob;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static CASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"case\s+(\w+)(?:\s*=\s*["']([^"']+)["'])?"#).expect("static regex")
});

// `[^:]*` keeps the match inside one case arm; a case whose body returns a
// bound value (not a literal) must not steal the next arm's code.
static ERROR_CASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"case\s+\.(\w+)[^:]*:\s*return\s*(-\d+)").expect("static regex")
});

/// Source with comments removed, newline structure preserved.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::new();
    for (_, line) in comment_free_lines(source) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Whether a function with this name is declared in the source, ignoring
/// comments and private/fileprivate declarations.
pub fn function_exists(name: &str, source: &str) -> bool {
    let stripped = strip_comments(source);
    let re = match Regex::new(&format!(
        r"(?m)^(?P<prefix>[^\n]*?)\bfunc\s+{}\s*[<(]",
        regex::escape(name)
    )) {
        Ok(re) => re,
        Err(_) => return false,
    };
    re.captures_iter(&stripped)
        .any(|caps| !caps["prefix"].contains("private"))
}

/// Whether a stored property with this name is declared in the source.
pub fn property_exists(name: &str, source: &str) -> bool {
    let stripped = strip_comments(source);
    let re = match Regex::new(&format!(r"\bvar\s+{}\s*:", regex::escape(name))) {
        Ok(re) => re,
        Err(_) => return false,
    };
    re.is_match(&stripped)
}

/// Case values of an enum declared somewhere in the source tree.
///
/// Raw values win over case names so the comparison happens in the wire
/// vocabulary (`case inputRequired = "input_required"` yields
/// `input_required`). Returns `None` when the enum is not found.
pub fn find_enum_cases(sources: &Utf8Path, enum_name: &str) -> Option<Vec<String>> {
    let pattern = sources.join("**").join("*.swift");
    for entry in glob(pattern.as_str()).ok()? {
        let Ok(path) = entry else { continue };
        if path.to_string_lossy().contains(".build") {
            continue;
        }
        let Ok(contents) = fs::read_to_string(&path) else {
            continue;
        };
        if let Some(cases) = enum_cases_in(&contents, enum_name) {
            return Some(cases);
        }
    }
    None
}

/// Case values of an enum declared in this source text, if present.
pub fn enum_cases_in(source: &str, enum_name: &str) -> Option<Vec<String>> {
    let decl = Regex::new(&format!(
        r"enum\s+{}\s*[^{{]*\{{",
        regex::escape(enum_name)
    ))
    .ok()?;
    let m = decl.find(source)?;

    // Walk out the enum body, honoring nested braces.
    let body_start = m.end() - 1;
    let bytes = source.as_bytes();
    let mut depth = 1usize;
    let mut pos = body_start + 1;
    while pos < bytes.len() && depth > 0 {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }
        pos += 1;
    }
    let body = &source[body_start..pos];

    let mut cases: Vec<String> = CASE_RE
        .captures_iter(body)
        .map(|caps| {
            caps.get(2)
                .map(|raw| raw.as_str().to_string())
                .unwrap_or_else(|| caps[1].to_string())
        })
        .collect();

    if cases.is_empty() {
        return None;
    }
    cases.sort();
    Some(cases)
}

/// Dedicated error cases and their numeric codes, from patterns of the
/// shape `case .name ... : return -code`.
pub fn error_case_codes(source: &str) -> BTreeMap<String, i64> {
    let mut out = BTreeMap::new();
    for caps in ERROR_CASE_RE.captures_iter(source) {
        if let Ok(code) = caps[2].parse::<i64>() {
            out.insert(caps[1].to_string(), code);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn function_exists_matches_declarations() {
        let source = "\
public func listResources(cursor: String?) async throws -> [Resource] {}
func withSamplingHandler<T>(_ handler: T) {}
internal func readResource() {}
";
        assert!(function_exists("listResources", source));
        assert!(function_exists("withSamplingHandler", source));
        assert!(function_exists("readResource", source));
        assert!(!function_exists("callTool", source));
        // Name must match exactly, not as a prefix.
        assert!(!function_exists("listResource", source));
    }

    #[test]
    fn function_exists_skips_private_and_comments() {
        let source = "\
private func secretHelper() {}
fileprivate func alsoSecret() {}
// public func commentedOut() {}
/* func blockCommented() {} */
";
        assert!(!function_exists("secretHelper", source));
        assert!(!function_exists("alsoSecret", source));
        assert!(!function_exists("commentedOut", source));
        assert!(!function_exists("blockCommented", source));
    }

    #[test]
    fn property_exists_matches_var_declarations() {
        let source = "\
public var listChanged: Bool?
var roots: Capabilities.Roots?
// var commentedOut: Bool
";
        assert!(property_exists("listChanged", source));
        assert!(property_exists("roots", source));
        assert!(!property_exists("commentedOut", source));
        assert!(!property_exists("subscribe", source));
    }

    #[test]
    fn enum_cases_prefer_raw_values_and_sort() {
        let source = "\
public enum TaskStatus: String, Codable {
    case working
    case inputRequired = \"input_required\"
    case completed

    var isTerminal: Bool {
        switch self {
        case .completed: return true
        default: return false
        }
    }
}
";
        let cases = enum_cases_in(source, "TaskStatus").expect("enum found");
        assert_eq!(cases, vec!["completed", "input_required", "working"]);
    }

    #[test]
    fn enum_cases_absent_enum_is_none() {
        assert_eq!(enum_cases_in("struct NotAnEnum {}", "Role"), None);
    }

    #[test]
    fn find_enum_cases_walks_the_tree() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let nested = root.join("Sources").join("Base");
        fs::create_dir_all(&nested).expect("mkdir");
        fs::write(
            nested.join("Role.swift"),
            "public enum Role: String {\n    case user\n    case assistant\n}\n",
        )
        .expect("write");

        let cases = find_enum_cases(&root.join("Sources"), "Role").expect("found");
        assert_eq!(cases, vec!["assistant", "user"]);
        assert_eq!(find_enum_cases(&root.join("Sources"), "Missing"), None);
    }

    #[test]
    fn error_case_codes_map_cases_to_integers() {
        let source = "\
public var code: Int {
    switch self {
    case .parseError: return -32700
    case .invalidRequest: return -32600
    case .serverError(let code, _):
        return code
    case .methodNotFound: return -32601
    }
}
";
        let codes = error_case_codes(source);
        assert_eq!(codes.get("parseError"), Some(&-32700));
        assert_eq!(codes.get("invalidRequest"), Some(&-32600));
        assert_eq!(codes.get("methodNotFound"), Some(&-32601));
        // Returns a bound value, not a literal code.
        assert!(!codes.contains_key("serverError"));
    }
}
