//! Prompts for the LLM clean-up of OCR text.
//!
//! Everything here is a pure function of (language code, enhancement level,
//! raw text), so prompt regressions are caught by plain unit tests.
//! The prompts are in Vietnamese because the documents are.

use crate::config::EnhancementLevel;

/// Fixed system instruction for every enhancement call.
pub const SYSTEM_PROMPT: &str = r#"Bạn là chuyên gia hiệu đính văn bản được trích xuất bằng OCR. Hãy sửa văn bản theo bốn nhóm lỗi sau:

1. **Dấu tiếng Việt:**
   - Khôi phục dấu thanh và dấu phụ bị mất hoặc nhận dạng sai (ă, â, ê, ô, ơ, ư, đ)

2. **Ký tự bị nhận dạng nhầm:**
   - Các cặp dễ nhầm: 0/O, 1/l/I, 5/S, 8/B, v/u, n/h
   - Khoảng trắng đặt sai vị trí

3. **Chính tả và ngữ pháp:**
   - Sửa từ sai chính tả, chỉnh ngữ pháp khi thật cần thiết
   - Giữ nguyên tên riêng, số liệu, ngày tháng và thuật ngữ chuyên ngành

4. **Cấu trúc đoạn văn:**
   - Giữ nguyên cách chia đoạn, nối lại những dòng bị ngắt không hợp lý
   - Giữ nguyên định dạng số, ngày tháng, địa chỉ

**NGUYÊN TẮC BẮT BUỘC:**
- Chỉ sửa những lỗi rõ ràng do OCR gây ra, không đoán mò
- KHÔNG tóm tắt, KHÔNG diễn giải lại, KHÔNG thêm hoặc bớt nội dung
- KHÔNG thay đổi ý nghĩa gốc
- Chỉ trả về văn bản đã sửa, không bọc trong khối ``` và không kèm lời giải thích"#;

/// Language mode named in the user instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageMode {
    Vietnamese,
    English,
    Bilingual,
}

impl LanguageMode {
    /// Derive the mode by looking for the `vie` and `eng` markers in a
    /// Tesseract language code. Codes with both or neither are bilingual.
    pub fn from_code(code: &str) -> Self {
        let code = code.to_lowercase();
        match (code.contains("vie"), code.contains("eng")) {
            (true, false) => LanguageMode::Vietnamese,
            (false, true) => LanguageMode::English,
            _ => LanguageMode::Bilingual,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LanguageMode::Vietnamese => "Tiếng Việt",
            LanguageMode::English => "Tiếng Anh",
            LanguageMode::Bilingual => "Tiếng Việt và Tiếng Anh (song ngữ)",
        }
    }
}

/// The instruction sentence for an enhancement level.
pub fn level_instruction(level: EnhancementLevel) -> &'static str {
    match level {
        EnhancementLevel::Light => {
            "Chỉ sửa những lỗi rõ ràng nhất (thiếu dấu, ký tự nhầm dễ nhận biết). Giữ nguyên phần lớn văn bản."
        }
        EnhancementLevel::Medium => {
            "Sửa lỗi OCR và lỗi chính tả phổ biến, điều chỉnh định dạng nhẹ nhàng. Đây là mức khuyên dùng."
        }
        EnhancementLevel::Strong => {
            "Sửa toàn diện lỗi OCR, chính tả, ngữ pháp và định dạng để văn bản dễ đọc nhất."
        }
    }
}

/// Build the user instruction: language mode, level instruction, and the raw
/// text verbatim inside a fenced block.
pub fn build_user_prompt(language_code: &str, level: EnhancementLevel, raw_text: &str) -> String {
    format!(
        "Đây là văn bản được trích xuất bằng OCR (nhận dạng ký tự quang học).\n\n\
**Ngôn ngữ:** {language}\n\n\
**Yêu cầu:** {instruction}\n\n\
**Văn bản gốc từ OCR:**\n\
```\n\
{raw_text}\n\
```\n\n\
Hãy trả về phiên bản đã được chỉnh sửa, giữ nguyên cấu trúc và nội dung gốc.",
        language = LanguageMode::from_code(language_code).label(),
        instruction = level_instruction(level),
    )
}
