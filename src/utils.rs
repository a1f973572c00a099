use dirs::data_dir;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};

static NAMED_PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(urlname|key)\}").expect("valid placeholder regex"));

pub const CONFIG_DIR_ENV: &str = "COMMUNITY_EVENTS_CONFIG_DIR";

pub fn data_root() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join("community-events")
}

pub fn settings_path(root: &Path) -> PathBuf {
    root.join("config.json")
}

pub fn groups_path(root: &Path) -> PathBuf {
    root.join("groups.json")
}

/// Fills a URI template. A template with named `{urlname}`/`{key}`
/// placeholders uses only those; otherwise its `%s` slots take the slug, then
/// the key. Substituted values are never expanded again.
pub fn expand_uri(template: &str, urlname: &str, key: &str) -> String {
    if NAMED_PLACEHOLDER_RE.is_match(template) {
        return NAMED_PLACEHOLDER_RE
            .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
                "urlname" => urlname,
                _ => key,
            })
            .into_owned();
    }
    let mut values = [urlname, key].into_iter();
    let mut pieces = template.split("%s");
    let mut expanded = pieces.next().unwrap_or_default().to_string();
    for piece in pieces {
        match values.next() {
            Some(value) => expanded.push_str(value),
            None => expanded.push_str("%s"),
        }
        expanded.push_str(piece);
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_named_placeholders() {
        assert_eq!(
            expand_uri("/2/events?group_urlname={urlname}&key={key}", "phpminds", "abc"),
            "/2/events?group_urlname=phpminds&key=abc"
        );
    }

    #[test]
    fn expands_positional_placeholders() {
        assert_eq!(
            expand_uri("/2/groups?group_urlname=%s&key=%s&sign=true", "nottstest", "k1"),
            "/2/groups?group_urlname=nottstest&key=k1&sign=true"
        );
        assert_eq!(expand_uri("%s", "only", "k"), "only");
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        assert_eq!(
            expand_uri("/events/{urlname}?key={key}&x=%s", "odd%sslug", "k1"),
            "/events/odd%sslug?key=k1&x=%s"
        );
        assert_eq!(
            expand_uri("/groups/%s?key=%s", "odd%sslug", "k1"),
            "/groups/odd%sslug?key=k1"
        );
        assert_eq!(
            expand_uri("/groups/{urlname}?key={key}", "{key}", "{urlname}"),
            "/groups/{key}?key={urlname}"
        );
    }
}
