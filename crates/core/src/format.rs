/// Formats a face value the way vi-VN renders dong: `100.000đ`.
pub fn format_vnd(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out.push('đ');
    out
}

/// Short form used on prize tags: whole thousands as `100K`, anything else in full.
pub fn short_amount(amount: u64) -> String {
    if amount >= 1_000 && amount % 1_000 == 0 {
        format!("{}K", amount / 1_000)
    } else {
        format_vnd(amount)
    }
}
