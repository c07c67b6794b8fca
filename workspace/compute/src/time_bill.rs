//! Duration and rate parsing for time bills and the per-day calendar summary.
//!
//! Durations arrive either as decimal hours ("2.5") or as a clock value
//! ("1:30"). Anything else is read like a lenient float: the longest numeric
//! prefix counts and text without one counts as zero.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, Months, NaiveDate};
use model::entities::time_bill::{self, TimeBillStatus};
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument};

use crate::error::{ComputeError, Result};

static CLOCK_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid clock pattern"));

static NUMERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)").expect("valid numeric pattern"));

/// Reads the leading number of `raw`, ignoring leading whitespace and any
/// trailing text. Returns zero when there is no leading number.
pub fn parse_lenient_decimal(raw: &str) -> Decimal {
    let trimmed = raw.trim_start();
    NUMERIC_PREFIX
        .find(trimmed)
        .and_then(|m| Decimal::from_str(m.as_str().trim_end_matches('.')).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Hours represented by a recorded duration.
pub fn parse_duration_hours(raw: &str) -> Decimal {
    if let Some(caps) = CLOCK_DURATION.captures(raw) {
        let hours = Decimal::from_str(&caps[1]).unwrap_or(Decimal::ZERO);
        let minutes = Decimal::from_str(&caps[2]).unwrap_or(Decimal::ZERO);
        return hours + minutes / Decimal::from(60);
    }
    parse_lenient_decimal(raw)
}

/// Amount billed for a single time bill: hours times hourly rate. `None`
/// when the product does not fit a `Decimal`.
pub fn checked_line_amount(duration: &str, hourly_rate: &str) -> Option<Decimal> {
    parse_duration_hours(duration).checked_mul(parse_lenient_decimal(hourly_rate))
}

/// Like [`checked_line_amount`], clamped to the `Decimal` range.
pub fn line_amount(duration: &str, hourly_rate: &str) -> Decimal {
    parse_duration_hours(duration).saturating_mul(parse_lenient_decimal(hourly_rate))
}

/// Inclusive date range covered by a calendar summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CalendarRange {
    /// Builds a range, filling a missing bound with the first or last day of
    /// the month containing `today`.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self> {
        let month_start = today.with_day(1).unwrap_or(today);
        let month_end = month_start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(today);

        let start = start.unwrap_or(month_start);
        let end = end.unwrap_or(month_end);
        if start > end {
            return Err(ComputeError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Totals for a single day.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total_hours: Decimal,
    pub total_amount: Decimal,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarSummary {
    pub range: CalendarRange,
    pub days: Vec<DaySummary>,
    pub total_hours: Decimal,
    pub total_amount: Decimal,
    pub total_entries: usize,
}

/// The day a time bill counts towards.
pub fn effective_date(bill: &time_bill::Model) -> NaiveDate {
    bill.date_of_work.unwrap_or_else(|| bill.created_at.date())
}

/// Groups bills by their effective date. Bills outside `range` are skipped.
/// Hours and amounts are rounded to two decimal places after summing; sums
/// that leave the `Decimal` range are clamped.
pub fn summarize(bills: &[time_bill::Model], range: CalendarRange) -> CalendarSummary {
    let mut by_day: BTreeMap<NaiveDate, (Decimal, Decimal, usize)> = BTreeMap::new();

    for bill in bills {
        let date = effective_date(bill);
        if !range.contains(date) {
            continue;
        }
        let hours = parse_duration_hours(&bill.duration);
        let amount = line_amount(&bill.duration, &bill.hourly_rate);
        let day = by_day
            .entry(date)
            .or_insert((Decimal::ZERO, Decimal::ZERO, 0));
        day.0 = day.0.saturating_add(hours);
        day.1 = day.1.saturating_add(amount);
        day.2 += 1;
    }

    let mut total_hours = Decimal::ZERO;
    let mut total_amount = Decimal::ZERO;
    let mut total_entries = 0;
    let days = by_day
        .into_iter()
        .map(|(date, (hours, amount, entries))| {
            total_hours = total_hours.saturating_add(hours);
            total_amount = total_amount.saturating_add(amount);
            total_entries += entries;
            DaySummary {
                date,
                total_hours: hours.round_dp(2),
                total_amount: amount.round_dp(2),
                entries,
            }
        })
        .collect();

    CalendarSummary {
        range,
        days,
        total_hours: total_hours.round_dp(2),
        total_amount: total_amount.round_dp(2),
        total_entries,
    }
}

/// Loads the live time bills falling into `range` and summarizes them.
#[instrument(skip(db))]
pub async fn calendar_summary<C>(
    db: &C,
    range: CalendarRange,
    status: Option<TimeBillStatus>,
) -> Result<CalendarSummary>
where
    C: ConnectionTrait,
{
    let created_from = range.start.and_hms_opt(0, 0, 0);
    let created_until = range
        .end
        .succ_opt()
        .and_then(|next| next.and_hms_opt(0, 0, 0));

    let mut undated = Condition::all().add(time_bill::Column::DateOfWork.is_null());
    if let Some(from) = created_from {
        undated = undated.add(time_bill::Column::CreatedAt.gte(from));
    }
    if let Some(until) = created_until {
        undated = undated.add(time_bill::Column::CreatedAt.lt(until));
    }

    let mut query = time_bill::Entity::find_active().filter(
        Condition::any()
            .add(time_bill::Column::DateOfWork.between(range.start, range.end))
            .add(undated),
    );
    if let Some(status) = status {
        query = query.filter(time_bill::Column::Status.eq(status));
    }

    let bills = query
        .order_by_asc(time_bill::Column::Id)
        .all(db)
        .await?;
    debug!(count = bills.len(), "Fetched time bills for calendar");

    Ok(summarize(&bills, range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, EntityTrait, Set};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bill(duration: &str, rate: &str, date_of_work: Option<NaiveDate>, created: NaiveDate) -> time_bill::Model {
        let created_at = created.and_hms_opt(15, 45, 0).unwrap();
        time_bill::Model {
            id: 0,
            customer_id: 1,
            matter_id: None,
            user_id: None,
            description: None,
            date_of_work,
            duration: duration.to_string(),
            hourly_rate: rate.to_string(),
            status: TimeBillStatus::Pending,
            is_delete: false,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_clock_and_decimal_durations() {
        assert_eq!(parse_duration_hours("1:30"), Decimal::new(15, 1));
        assert_eq!(parse_duration_hours("12:45"), Decimal::new(1275, 2));
        assert_eq!(parse_duration_hours("2.5"), Decimal::new(25, 1));
        assert_eq!(line_amount("1:30", "100"), Decimal::from(150));
        assert_eq!(line_amount("2.5", "40"), Decimal::from(100));
    }

    #[test]
    fn test_lenient_parsing_takes_numeric_prefix() {
        assert_eq!(parse_lenient_decimal("  3.75h"), Decimal::new(375, 2));
        assert_eq!(parse_lenient_decimal("120 USD"), Decimal::from(120));
        assert_eq!(parse_lenient_decimal(".5"), Decimal::new(5, 1));
        assert_eq!(parse_lenient_decimal("7."), Decimal::from(7));
        assert_eq!(parse_lenient_decimal("abc"), Decimal::ZERO);
        assert_eq!(parse_lenient_decimal(""), Decimal::ZERO);
        // Three-digit hours do not match the clock form and fall back to the prefix.
        assert_eq!(parse_duration_hours("100:30"), Decimal::from(100));
    }

    #[test]
    fn test_range_defaults_to_current_month() {
        let range = CalendarRange::resolve(None, None, date(2024, 2, 14)).unwrap();
        assert_eq!(range.start, date(2024, 2, 1));
        assert_eq!(range.end, date(2024, 2, 29));

        let range = CalendarRange::resolve(Some(date(2024, 1, 10)), None, date(2024, 12, 3)).unwrap();
        assert_eq!(range.end, date(2024, 12, 31));

        assert!(CalendarRange::resolve(Some(date(2024, 3, 2)), Some(date(2024, 3, 1)), date(2024, 3, 1)).is_err());
    }

    #[test]
    fn test_summary_groups_by_work_date_then_created_date() {
        let range = CalendarRange::resolve(None, None, date(2024, 5, 1)).unwrap();
        let bills = vec![
            bill("1:30", "100", Some(date(2024, 5, 3)), date(2024, 4, 20)),
            bill("2.5", "40", Some(date(2024, 5, 3)), date(2024, 5, 3)),
            bill("1", "60", None, date(2024, 5, 1)),
            // Worked in April even though it was recorded in May.
            bill("4", "10", Some(date(2024, 4, 30)), date(2024, 5, 2)),
        ];

        let summary = summarize(&bills, range);
        assert_eq!(summary.days.len(), 2);
        assert_eq!(summary.days[0].date, date(2024, 5, 1));
        assert_eq!(summary.days[0].total_amount, Decimal::from(60));
        assert_eq!(summary.days[1].date, date(2024, 5, 3));
        assert_eq!(summary.days[1].total_amount, Decimal::from(250));
        assert_eq!(summary.days[1].total_hours, Decimal::from(4));
        assert_eq!(summary.days[1].entries, 2);
        assert_eq!(summary.total_amount, Decimal::from(310));
        assert_eq!(summary.total_hours, Decimal::from(5));
        assert_eq!(summary.total_entries, 3);
    }

    #[test]
    fn test_amounts_are_rounded_to_cents() {
        let range = CalendarRange::resolve(None, None, date(2024, 5, 1)).unwrap();
        let bills = vec![bill("0:20", "100", Some(date(2024, 5, 2)), date(2024, 5, 2))];

        let summary = summarize(&bills, range);
        assert_eq!(summary.total_amount, Decimal::new(3333, 2));
        assert_eq!(summary.total_hours, Decimal::new(33, 2));
    }

    #[test]
    fn test_oversized_amounts_are_clamped() {
        let huge = "99999999999999999999";
        assert_eq!(checked_line_amount(huge, huge), None);
        assert_eq!(checked_line_amount("1:30", "100"), Some(Decimal::from(150)));
        assert_eq!(line_amount(huge, huge), Decimal::MAX);
        assert_eq!(line_amount(huge, &format!("-{huge}")), Decimal::MIN);

        let range = CalendarRange::resolve(None, None, date(2024, 5, 1)).unwrap();
        let bills = vec![
            bill(huge, huge, Some(date(2024, 5, 2)), date(2024, 5, 2)),
            bill(huge, huge, Some(date(2024, 5, 2)), date(2024, 5, 2)),
        ];
        let summary = summarize(&bills, range);
        assert_eq!(summary.days[0].total_amount, Decimal::MAX);
        assert_eq!(summary.total_amount, Decimal::MAX);
        assert_eq!(summary.total_entries, 2);
    }

    #[tokio::test]
    async fn test_calendar_summary_skips_deleted_and_filters_status() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let insert = |duration: &str, status: TimeBillStatus| time_bill::ActiveModel {
            customer_id: Set(1),
            date_of_work: Set(Some(date(2024, 6, 10))),
            duration: Set(duration.to_string()),
            hourly_rate: Set("100".to_string()),
            status: Set(status),
            ..Default::default()
        };
        insert("1", TimeBillStatus::Pending).insert(&db).await.unwrap();
        insert("2", TimeBillStatus::Approved).insert(&db).await.unwrap();
        let gone = insert("8", TimeBillStatus::Pending).insert(&db).await.unwrap();
        time_bill::Entity::soft_delete(&db, gone.id).await.unwrap();
        let outside = time_bill::ActiveModel {
            date_of_work: Set(Some(date(2024, 7, 1))),
            ..insert("5", TimeBillStatus::Pending)
        };
        outside.insert(&db).await.unwrap();

        let range = CalendarRange::resolve(None, None, date(2024, 6, 1)).unwrap();
        let all = calendar_summary(&db, range, None).await.unwrap();
        assert_eq!(all.total_entries, 2);
        assert_eq!(all.total_amount, Decimal::from(300));

        let pending = calendar_summary(&db, range, Some(TimeBillStatus::Pending)).await.unwrap();
        assert_eq!(pending.total_entries, 1);
        assert_eq!(pending.total_amount, Decimal::from(100));

        assert_eq!(time_bill::Entity::find().all(&db).await.unwrap().len(), 4);
    }
}
