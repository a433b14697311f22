//! # 오프셋 해석기 (Offset Resolver)
//!
//! 현재 문서 텍스트에서 리터럴 부분 문자열의 **첫 번째** 위치를 찾습니다.
//!
//! - 문서 순서대로 선형 탐색하며, 처음 일치한 위치가 이깁니다 (퍼지 매칭 없음).
//! - 같은 문자열이 여러 번 나오면 항상 첫 번째 위치로 해석됩니다. 알려진 한계입니다.
//! - 찾지 못하면 `None`입니다. 에러가 아니며, 호출자가 해당 주석을 건너뜁니다.
//!
//! 오프셋은 바이트가 아닌 유니코드 문자(char) 단위입니다.
//! 한글 1자 = 1문자 (`.len()`은 3바이트를 반환하므로 쓰지 않습니다).

use std::ops::Range;

/// 문자 단위 구간 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// 두 구간이 한 문자라도 겹치는지 확인합니다. 맞닿기만 한 구간은 겹치지 않습니다.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// 일치 결과: 문자 구간과, 문자열 치환에 쓰는 바이트 구간
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub span: Span,
    pub bytes: Range<usize>,
}

/// `needle`이 `haystack`에서 처음 나타나는 위치를 찾습니다.
///
/// 빈 `needle`은 어디에도 일치하지 않는 것으로 취급합니다.
pub fn find_first(haystack: &str, needle: &str) -> Option<TextMatch> {
    if needle.is_empty() {
        return None;
    }

    let byte_start = haystack.find(needle)?;
    let start = haystack[..byte_start].chars().count();

    Some(TextMatch {
        span: Span {
            start,
            end: start + needle.chars().count(),
        },
        bytes: byte_start..byte_start + needle.len(),
    })
}

/// `find_first`의 문자 구간만 돌려줍니다.
pub fn resolve(haystack: &str, needle: &str) -> Option<Span> {
    find_first(haystack, needle).map(|m| m.span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_occurrence_wins_on_every_call() {
        let text = "The cat sat next to another cat.";
        let first = resolve(text, "cat");
        assert_eq!(first, Some(Span { start: 4, end: 7 }));
        for _ in 0..5 {
            assert_eq!(resolve(text, "cat"), first);
        }
    }

    #[test]
    fn missing_or_empty_needle_is_not_found() {
        assert_eq!(resolve("The cat sat.", "dog"), None);
        assert_eq!(resolve("The cat sat.", ""), None);
        assert_eq!(resolve("", "cat"), None);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let text = "나의 고양이는 cat";
        let found = find_first(text, "cat").expect("cat is present");
        assert_eq!(found.span, Span { start: 8, end: 11 });
        assert_eq!(&text[found.bytes.clone()], "cat");

        let found = find_first(text, "고양이").expect("고양이 is present");
        assert_eq!(found.span, Span { start: 3, end: 6 });
        assert_eq!(&text[found.bytes], "고양이");
    }

    #[test]
    fn whitespace_changes_break_the_match() {
        assert_eq!(resolve("The  cat sat.", "The cat"), None);
    }

    #[test]
    fn adjacent_spans_do_not_overlap() {
        let a = Span { start: 0, end: 3 };
        let b = Span { start: 3, end: 6 };
        let c = Span { start: 2, end: 4 };
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }
}
