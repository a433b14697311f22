//! # 주석 마크업 제거
//!
//! 에디터는 주석 구간을 `<span data-annotation-id="...">…</span>`으로 감쌉니다.
//! 외부 서비스가 돌려준 텍스트에 이 래퍼가 섞여 들어올 수 있으므로,
//! 저장 전에 래퍼만 벗기고 안쪽 텍스트는 그대로 남깁니다.
//! 주석과 무관한 다른 `<span>`이나 문자는 건드리지 않습니다.

use std::sync::OnceLock;

use regex::Regex;

const ANNOTATION_ATTR: &str = "data-annotation-id";

fn span_tag_regex() -> &'static Regex {
    static SPAN_TAG: OnceLock<Regex> = OnceLock::new();
    SPAN_TAG.get_or_init(|| Regex::new(r"(?i)<(/?)span\b[^>]*>").expect("Invalid span tag regex"))
}

/// 주석 래퍼 `<span>`을 제거합니다. 중첩된 래퍼도 처리합니다.
///
/// 여는 태그마다 "주석 래퍼인가"를 스택에 쌓고, 닫는 태그를 만나면 꺼내서
/// 짝이 되는 여는 태그가 주석 래퍼였을 때만 닫는 태그도 지웁니다.
pub fn strip_annotation_markup(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut stack: Vec<bool> = Vec::new();
    let mut last = 0;

    for caps in span_tag_regex().captures_iter(text) {
        let Some(tag) = caps.get(0) else { continue };
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());

        let drop_tag = if closing {
            stack.pop().unwrap_or(false)
        } else {
            let is_annotation = tag.as_str().to_ascii_lowercase().contains(ANNOTATION_ATTR);
            stack.push(is_annotation);
            is_annotation
        };

        if drop_tag {
            cleaned.push_str(&text[last..tag.start()]);
            last = tag.end();
        }
    }

    cleaned.push_str(&text[last..]);
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(strip_annotation_markup("The cat sat."), "The cat sat.");
        assert_eq!(strip_annotation_markup("a < b > c"), "a < b > c");
    }

    #[test]
    fn annotation_wrappers_are_removed() {
        let html = r#"The <span class="bg-yellow-200" data-annotation-id="1736600000000">feline</span> sat."#;
        assert_eq!(strip_annotation_markup(html), "The feline sat.");
    }

    #[test]
    fn nested_wrappers_and_foreign_spans() {
        let html = concat!(
            r#"<span data-annotation-id="1">A <span class="em">b</span> "#,
            r#"<SPAN DATA-ANNOTATION-ID="2">c</SPAN></span> d"#,
        );
        assert_eq!(
            strip_annotation_markup(html),
            r#"A <span class="em">b</span> c d"#
        );
    }

    #[test]
    fn stray_closing_tag_is_kept() {
        assert_eq!(strip_annotation_markup("x</span>y"), "x</span>y");
    }
}
