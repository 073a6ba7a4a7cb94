//! 控制标签词法分析器
//!
//! 将带内联指令的字符串切分为有序的片段序列。
//!
//! 支持的指令（区分大小写）：
//! - `<rate=N>`：N 为非负整数
//! - `<volume=F>`：F 为 `d.d+` 形式的小数，例如 `0.9`
//! - `<voice=male>` / `<voice=female>` / `<voice=default>`
//! - `<default>`
//!
//! 其余内容一律作为字面文本。格式错误的指令（如 `<rate=abc>`）退化为文本，
//! 词法分析永远不会失败。

use super::segment::{Segment, Token, VoiceRole};

/// 对输入进行分词，保留每个片段的原始切片
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(offset) = input[cursor..].find('<') {
        let open = cursor + offset;

        // 指令内部不含 '<'，遇到下一个 '<' 时从那里重新开始
        let Some(next_offset) = input[open + 1..].find(|c: char| c == '<' || c == '>') else {
            break;
        };
        let next = open + 1 + next_offset;
        if input.as_bytes()[next] == b'<' {
            cursor = next;
            continue;
        }
        let close = next;

        if let Some(segment) = parse_directive(&input[open + 1..close]) {
            push_text(&mut tokens, &input[text_start..open]);
            tokens.push(Token {
                segment,
                raw: &input[open..=close],
            });
            text_start = close + 1;
        }
        // 格式错误时整个 `<...>` 都是文本
        cursor = close + 1;
    }

    push_text(&mut tokens, &input[text_start..]);
    tokens
}

/// 对输入进行词法分析
pub fn lex(input: &str) -> Vec<Segment> {
    tokenize(input)
        .into_iter()
        .map(|token| token.segment)
        .collect()
}

/// 空文本片段直接丢弃
fn push_text<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str) {
    if !text.is_empty() {
        tokens.push(Token {
            segment: Segment::Text(text.to_string()),
            raw: text,
        });
    }
}

/// 解析 `<` 与 `>` 之间的内容
fn parse_directive(inner: &str) -> Option<Segment> {
    match inner {
        "default" => Some(Segment::ResetDefaults),
        "voice=male" => Some(Segment::SelectVoice(VoiceRole::Male)),
        "voice=female" => Some(Segment::SelectVoice(VoiceRole::Female)),
        "voice=default" => Some(Segment::SelectVoice(VoiceRole::Default)),
        _ => {
            if let Some(value) = inner.strip_prefix("rate=") {
                parse_rate(value).map(Segment::SetRate)
            } else if let Some(value) = inner.strip_prefix("volume=") {
                parse_volume(value).map(Segment::SetVolume)
            } else {
                None
            }
        }
    }
}

/// `\d+`，溢出视为格式错误
fn parse_rate(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// `\d\.\d+`
fn parse_volume(value: &str) -> Option<f32> {
    let bytes = value.as_bytes();
    if bytes.len() < 3
        || !bytes[0].is_ascii_digit()
        || bytes[1] != b'.'
        || !bytes[2..].iter().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    #[test]
    fn test_plain_text_is_single_segment() {
        assert_eq!(lex("hello world"), vec![text("hello world")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(lex("").is_empty());
    }

    #[test]
    fn test_all_directive_forms() {
        let segments = lex("<rate=200><volume=0.9><voice=male><voice=female><voice=default><default>");
        assert_eq!(
            segments,
            vec![
                Segment::SetRate(200),
                Segment::SetVolume(0.9),
                Segment::SelectVoice(VoiceRole::Male),
                Segment::SelectVoice(VoiceRole::Female),
                Segment::SelectVoice(VoiceRole::Default),
                Segment::ResetDefaults,
            ]
        );
    }

    #[test]
    fn test_order_preserved_and_empty_fragments_dropped() {
        let segments = lex("A <rate=200> B<default>");
        assert_eq!(
            segments,
            vec![text("A "), Segment::SetRate(200), text(" B"), Segment::ResetDefaults]
        );
    }

    #[test]
    fn test_malformed_rate_is_text() {
        assert_eq!(lex("<rate=abc> hi"), vec![text("<rate=abc> hi")]);
    }

    #[test]
    fn test_malformed_volume_forms_are_text() {
        // 小数点前必须恰好一位数字，小数点后至少一位
        for input in ["<volume=10.5>", "<volume=.5>", "<volume=1>", "<volume=1.>", "<volume=0,5>"] {
            assert_eq!(lex(input), vec![text(input)], "input: {}", input);
        }
    }

    #[test]
    fn test_directives_are_case_sensitive() {
        assert_eq!(lex("<Rate=100>"), vec![text("<Rate=100>")]);
        assert_eq!(lex("<voice=Male>"), vec![text("<voice=Male>")]);
        assert_eq!(lex("<DEFAULT>"), vec![text("<DEFAULT>")]);
    }

    #[test]
    fn test_rate_rejects_sign_and_whitespace() {
        assert_eq!(lex("<rate=-5>"), vec![text("<rate=-5>")]);
        assert_eq!(lex("<rate= 5>"), vec![text("<rate= 5>")]);
        assert_eq!(lex("<rate=>"), vec![text("<rate=>")]);
    }

    #[test]
    fn test_rate_overflow_degrades_to_text() {
        let input = "<rate=99999999999999>";
        assert_eq!(lex(input), vec![text(input)]);
    }

    #[test]
    fn test_nested_open_bracket() {
        // 第一个 '<' 是文本，第二个开始的才是指令
        assert_eq!(
            lex("a <<rate=5> b"),
            vec![text("a <"), Segment::SetRate(5), text(" b")]
        );
        assert_eq!(
            lex("<rate=5<rate=6>"),
            vec![text("<rate=5"), Segment::SetRate(6)]
        );
    }

    #[test]
    fn test_unclosed_tag_is_text() {
        assert_eq!(lex("x <voice=male"), vec![text("x <voice=male")]);
    }

    #[test]
    fn test_long_run_of_open_brackets() {
        let input = format!("{}>{}<rate=120>", "<".repeat(200_000), "x");
        let segments = lex(&input);
        assert_eq!(
            segments,
            vec![text(&format!("{}>x", "<".repeat(200_000))), Segment::SetRate(120)]
        );
    }

    #[test]
    fn test_malformed_tag_before_valid_tag() {
        assert_eq!(
            lex("<rate=x><rate=7>y"),
            vec![text("<rate=x>"), Segment::SetRate(7), text("y")]
        );
    }

    #[test]
    fn test_unicode_text_around_directives() {
        assert_eq!(
            lex("你好<voice=female>世界"),
            vec![
                text("你好"),
                Segment::SelectVoice(VoiceRole::Female),
                text("世界")
            ]
        );
    }

    #[test]
    fn test_token_raw_keeps_authored_text() {
        let tokens = tokenize("<volume=0.90>x");
        assert_eq!(tokens[0].raw, "<volume=0.90>");
        assert_eq!(tokens[0].segment, Segment::SetVolume(0.9));
        assert_eq!(tokens[1].raw, "x");
    }

    proptest! {
        #[test]
        fn test_tokenize_reconstructs_input(input in "[a-z <>=.0-9]{0,64}") {
            let rebuilt: String = tokenize(&input).iter().map(|t| t.raw).collect();
            prop_assert_eq!(rebuilt, input);
        }

        #[test]
        fn test_tokenize_reconstructs_arbitrary_strings(input in ".{0,64}") {
            let tokens = tokenize(&input);
            let rebuilt: String = tokens.iter().map(|t| t.raw).collect();
            prop_assert_eq!(&rebuilt, &input);
            // 不产生空文本片段
            prop_assert!(tokens.iter().all(|t| !t.raw.is_empty()));
        }
    }
}
