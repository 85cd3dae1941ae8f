//! 策略引擎：退货 / 退款资格的纯函数计算
//!
//! 100% 确定性、无 I/O。窗口按首个条目的类目查表，退货与退款阈值相互独立
//! （退款窗口通常更短、先过期）。

use chrono::{DateTime, Utc};

use crate::agent::state::{Eligibility, OrderSnapshot};

pub const POLICY_VERSION: &str = "v1.0";

pub const DEFAULT_RETURN_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_REFUND_WINDOW_DAYS: i64 = 14;

/// 类目覆盖表：(类目, 退货天数, 退款天数)
const CATEGORY_OVERRIDES: &[(&str, i64, i64)] = &[
    ("electronics", 45, 14),
    ("clothing", 60, 30),
];

/// 按类目取退货 / 退款窗口；无覆盖时用默认值
pub fn policy_windows(category: Option<&str>) -> (i64, i64) {
    if let Some(cat) = category {
        let cat = cat.to_lowercase();
        for (name, ret, refund) in CATEGORY_OVERRIDES {
            if *name == cat {
                return (*ret, *refund);
            }
        }
    }
    (DEFAULT_RETURN_WINDOW_DAYS, DEFAULT_REFUND_WINDOW_DAYS)
}

/// 自送达日起经过的整天数；未送达返回 None
pub fn days_since_delivery(delivery_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    delivery_date.map(|d| (now - d).num_days())
}

/// 资格检查主入口。`now` 显式传入以便表驱动测试边界天数。
pub fn check_window(order: &OrderSnapshot, now: DateTime<Utc>) -> Eligibility {
    let category = order
        .items
        .first()
        .and_then(|item| item.category.as_deref());
    let (return_window, refund_window) = policy_windows(category);
    let days = days_since_delivery(order.delivery_date, now);

    let mut eligibility = Eligibility {
        is_return_eligible: false,
        is_refund_eligible: false,
        reason: String::new(),
        policy_version: POLICY_VERSION.to_string(),
        cutoff_days: return_window,
        days_since_delivery: days,
    };

    let status = order.status.to_lowercase();
    if matches!(status.as_str(), "cancelled" | "refunded" | "returned") {
        eligibility.reason = format!("Order is already {}", status);
        return eligibility;
    }

    if order.delivery_date.is_none() {
        eligibility.reason = "Order has not been delivered yet".to_string();
        return eligibility;
    }

    // 送达日在未来不应出现，防御性处理
    let days = match days {
        Some(d) if d >= 0 => d,
        _ => {
            eligibility.reason = "Invalid delivery date".to_string();
            return eligibility;
        }
    };

    eligibility.is_return_eligible = days <= return_window;
    eligibility.is_refund_eligible = days <= refund_window;

    eligibility.reason = match (eligibility.is_return_eligible, eligibility.is_refund_eligible) {
        (true, true) => format!(
            "Within {}-day return and {}-day refund window",
            return_window, refund_window
        ),
        (true, false) => format!(
            "Within {}-day return window (refund window expired)",
            return_window
        ),
        (false, true) => format!(
            "Within {}-day refund window (return window expired)",
            refund_window
        ),
        (false, false) => format!("Outside {}-day return window", return_window),
    };

    eligibility
}

/// 将资格结果转成用户可读的说明
pub fn format_eligibility_message(eligibility: &Eligibility) -> String {
    let days = eligibility.days_since_delivery.unwrap_or_default();
    match (
        eligibility.is_return_eligible,
        eligibility.is_refund_eligible,
    ) {
        (true, true) => format!(
            "Good news! Your order qualifies for both a **return** and a **refund**. \
             It's been {} days since delivery. {}.",
            days, eligibility.reason
        ),
        (true, false) => format!(
            "Your order qualifies for a **return**. It's been {} days since delivery. {}.",
            days, eligibility.reason
        ),
        (false, true) => format!(
            "Your order qualifies for a **refund**. It's been {} days since delivery. {}.",
            days, eligibility.reason
        ),
        (false, false) => format!(
            "Unfortunately, your order doesn't qualify for returns or refunds. {}. \
             It's been {} days since delivery.",
            eligibility.reason, days
        ),
    }
}
