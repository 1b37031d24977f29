use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How stretched a department would be if a leave request were granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentLoad {
    /// Active and on-leave, non-archived employees in the department.
    pub headcount: u32,
    /// Other employees already on approved leave overlapping the request.
    pub concurrent_on_leave: u32,
    /// `concurrent_on_leave / headcount * 100`, two decimal places.
    pub percent_on_leave: Decimal,
    /// The percentage reached the threshold.
    pub is_busy: bool,
}

/// Compares concurrent leave in a department against a threshold.
///
/// An empty department is never busy.
///
/// ```
/// use hr_engine::calculation::department_load;
/// use rust_decimal::Decimal;
///
/// let load = department_load(10, 3, Decimal::from(30));
/// assert!(load.is_busy);
/// assert!(!department_load(10, 2, Decimal::from(30)).is_busy);
/// ```
pub fn department_load(headcount: u32, concurrent_on_leave: u32, threshold_percent: Decimal) -> DepartmentLoad {
    if headcount == 0 {
        return DepartmentLoad {
            headcount,
            concurrent_on_leave,
            percent_on_leave: Decimal::ZERO,
            is_busy: false,
        };
    }
    let percent = (Decimal::from(concurrent_on_leave) / Decimal::from(headcount)
        * Decimal::ONE_HUNDRED)
        .round_dp(2);
    DepartmentLoad {
        headcount,
        concurrent_on_leave,
        percent_on_leave: percent,
        is_busy: percent >= threshold_percent,
    }
}

/// Shorthand for `department_load(..).is_busy`.
pub fn is_department_busy(headcount: u32, concurrent_on_leave: u32, threshold_percent: Decimal) -> bool {
    department_load(headcount, concurrent_on_leave, threshold_percent).is_busy
}
