// ==========================================
// 数据版本管理系统 - 单元格显示文本
// ==========================================
// 规则: 优先读取单元格“显示文本”，而非底层数值
// - 百分比格式: 按格式小数位输出，如 0.08125 + "0.000%" → "8.125%"
// - 常规格式: 原文为普通小数时保持原文，否则输出不含科学计数法的十进制文本
// - 其他数字格式: 使用格式化后的文本
// - 非数值单元格: 原文
// ==========================================

use umya_spreadsheet::Cell;

/// 读取单元格显示文本
pub fn display_text(cell: &Cell) -> String {
    let raw = cell.get_value().to_string();
    if cell.get_data_type() != "n" || raw.trim().is_empty() {
        return raw;
    }

    let format_code = cell
        .get_style()
        .get_number_format()
        .map(|f| f.get_format_code().to_string())
        .unwrap_or_default();

    if format_code.contains('%') {
        return match raw.trim().parse::<f64>() {
            Ok(value) => format_percent(value, &format_code),
            Err(_) => raw,
        };
    }

    if is_general_format(&format_code) {
        return plain_decimal(&raw);
    }

    cell.get_formatted_value()
}

/// 是否为常规（无显示格式）数字格式
fn is_general_format(format_code: &str) -> bool {
    let code = format_code.trim();
    code.is_empty() || code.eq_ignore_ascii_case("general") || code == "@"
}

/// 百分比显示: 小数位取格式中 '.' 之后、'%' 之前的 0 的个数
pub fn format_percent(value: f64, format_code: &str) -> String {
    format!("{:.*}%", percent_decimals(format_code), value * 100.0)
}

fn percent_decimals(format_code: &str) -> usize {
    let before_percent = format_code.split('%').next().unwrap_or_default();
    match before_percent.rfind('.') {
        Some(dot) => before_percent[dot + 1..]
            .chars()
            .take_while(|c| *c == '0' || *c == '#')
            .count(),
        None => 0,
    }
}

/// 数值原文转十进制文本（不使用科学计数法）
pub fn plain_decimal(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_plain_decimal_literal(trimmed) {
        return trimmed.to_string();
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => format!("{}", value),
        _ => raw.to_string(),
    }
}

/// 形如 -123.45 的普通小数字面量
fn is_plain_decimal_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || digits.starts_with('.') || digits.ends_with('.') {
        return false;
    }
    let mut seen_dot = false;
    digits.chars().all(|c| match c {
        '0'..='9' => true,
        '.' if !seen_dot => {
            seen_dot = true;
            true
        }
        _ => false,
    })
}
