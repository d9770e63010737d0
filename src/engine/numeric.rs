// ==========================================
// 数据版本管理系统 - token 数值解析与格式化
// ==========================================
// 规则: 非数值/空值按 0 计; 合计固定 2 位小数
// ==========================================

/// 合计小数位数
pub const TOTAL_DECIMAL_PLACES: usize = 2;

/// 解析 token 单元格文本，无法解析或非有限值时返回 0
pub fn parse_token_value(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// 格式化合计值（定点字符串）
pub fn format_total(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:.*}", TOTAL_DECIMAL_PLACES, value)
}

/// 解析合计字符串（已格式化的定点值）
pub fn parse_total(text: &str) -> f64 {
    parse_token_value(text)
}

/// 四舍五入到 2 位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_value() {
        assert_eq!(parse_token_value("100"), 100.0);
        assert_eq!(parse_token_value(" 2.5 "), 2.5);
        assert_eq!(parse_token_value(""), 0.0);
        assert_eq!(parse_token_value("abc"), 0.0);
        assert_eq!(parse_token_value("8.125%"), 0.0);
        assert_eq!(parse_token_value("NaN"), 0.0);
        assert_eq!(parse_token_value("inf"), 0.0);
        assert_eq!(parse_token_value("1e3"), 1000.0);
    }

    #[test]
    fn test_format_total() {
        assert_eq!(format_total(0.0), "0.00");
        assert_eq!(format_total(-0.0), "0.00");
        assert_eq!(format_total(1234.5), "1234.50");
        assert_eq!(format_total(1e15), "1000000000000000.00");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.33333), 33.33);
        assert_eq!(round2(66.666), 66.67);
    }
}
