// ============================================
// src/hiragana.rs
// 答え合わせ用の文字列正規化
// ============================================

/// カタカナ → ひらがな のコードポイント差
const KANA_OFFSET: u32 = 0x60;
/// 全角 → 半角 のコードポイント差
const FULLWIDTH_OFFSET: u32 = 0xFEE0;

/// カタカナ1文字をひらがなに変換する (対応するひらがながない文字はそのまま)
pub fn katakana_to_hiragana_char(c: char) -> char {
    match c {
        // ァ (U+30A1) 〜 ヶ (U+30F6)
        '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - KANA_OFFSET).unwrap_or(c),
        _ => c,
    }
}

/// 全角英数・記号 (U+FF01 〜 U+FF5E) を半角にする
fn fullwidth_to_halfwidth_char(c: char) -> char {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - FULLWIDTH_OFFSET).unwrap_or(c),
        _ => c,
    }
}

/// 答えを比較用の形にそろえる
///
/// 1. 前後の空白を除去
/// 2. カタカナ → ひらがな
/// 3. 全角英数 → 半角
/// 4. 空白 (全角スペース・BOM 含む) と中黒「・」を除去
pub fn normalize(input: &str) -> String {
    input
        .trim()
        .chars()
        .map(katakana_to_hiragana_char)
        .map(fullwidth_to_halfwidth_char)
        // char::is_whitespace は U+3000 (全角スペース) を含むが U+FEFF (BOM) は含まない
        .filter(|c| !c.is_whitespace() && !matches!(c, '\u{FEFF}' | '・'))
        .collect()
}

/// 漢字 (CJK統合漢字) を含むかどうか
pub fn contains_kanji(s: &str) -> bool {
    s.chars()
        .any(|c| matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '々'))
}
