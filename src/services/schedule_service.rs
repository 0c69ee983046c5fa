use chrono::{Datelike, Days, Months, NaiveDate, Utc};
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{Contract, PaymentCycle, PaymentStatus};

/// Один период графика платежей
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePeriod {
    pub due_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

/// Строит график платежей по диапазону дат договора.
///
/// Курсор стартует с даты начала и шагает на длину цикла (1/3/6/12 месяцев),
/// пока не перейдёт дату окончания. Дата платежа — позиция курсора, период —
/// календарный отрезок от первого числа месяца курсора, последний период
/// обрезается датой окончания договора. Не заданный цикл считается месячным
pub fn build_schedule(
    start: NaiveDate,
    end: NaiveDate,
    cycle: Option<PaymentCycle>,
) -> Vec<SchedulePeriod> {
    let step = cycle.unwrap_or(PaymentCycle::Monthly).step_months();
    let mut periods = Vec::new();
    let mut cursor = start;

    while cursor <= end {
        let period_start = cursor.with_day(1).unwrap_or(cursor);
        let mut period_end = period_start + Months::new(step) - Days::new(1);
        if period_end > end {
            period_end = end;
        }
        periods.push(SchedulePeriod {
            due_date: cursor,
            period_start,
            period_end,
        });
        cursor = cursor + Months::new(step);
    }

    periods
}

/// Генерирует записи графика для договора.
///
/// Идемпотентно: если по договору уже есть хоть один платёж — ничего не
/// делает. Совпадение (договор, дата платежа) пропускается без остановки
/// цикла, это же закрывает гонку параллельного создания. Возвращает число
/// вставленных записей
pub async fn generate_schedule_for_contract(
    pool: &PgPool,
    contract: &Contract,
    mark_first_paid: bool,
) -> AppResult<u64> {
    let exists: Option<(i32,)> =
        sqlx::query_as("SELECT 1 FROM rent_payments WHERE contract_id = $1 LIMIT 1")
            .bind(contract.id)
            .fetch_optional(pool)
            .await?;

    if exists.is_some() {
        tracing::debug!(
            "schedule for contract {} already generated, skipping",
            contract.contract_no
        );
        return Ok(0);
    }

    let periods = build_schedule(contract.start_date, contract.end_date, contract.payment_cycle);

    let mut inserted = 0u64;
    for (i, period) in periods.iter().enumerate() {
        let paid = i == 0 && mark_first_paid;
        let status = if paid {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Pending
        };
        let paid_at = if paid { Some(Utc::now()) } else { None };

        let result = sqlx::query(
            r#"
            INSERT INTO rent_payments (
                contract_id, due_date, amount, status, paid_at,
                period_start, period_end, overdue_processed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, false)
            ON CONFLICT (contract_id, due_date) DO NOTHING
            "#,
        )
        .bind(contract.id)
        .bind(period.due_date)
        .bind(contract.rent_amount)
        .bind(status)
        .bind(paid_at)
        .bind(period.period_start)
        .bind(period.period_end)
        .execute(pool)
        .await?;

        inserted += result.rows_affected();
    }

    tracing::info!(
        "generated {} rent payments for contract {}",
        inserted,
        contract.contract_no
    );

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_schedule_keeps_start_day() {
        let periods = build_schedule(
            date(2024, 1, 15),
            date(2024, 6, 15),
            Some(PaymentCycle::Monthly),
        );

        assert_eq!(periods.len(), 6);
        let due_dates: Vec<NaiveDate> = periods.iter().map(|p| p.due_date).collect();
        assert_eq!(
            due_dates,
            vec![
                date(2024, 1, 15),
                date(2024, 2, 15),
                date(2024, 3, 15),
                date(2024, 4, 15),
                date(2024, 5, 15),
                date(2024, 6, 15),
            ]
        );
        // все даты платежей внутри срока договора
        assert!(periods
            .iter()
            .all(|p| p.due_date >= date(2024, 1, 15) && p.due_date <= date(2024, 6, 15)));
    }

    #[test]
    fn test_period_bounds_are_calendar_months() {
        let periods = build_schedule(
            date(2024, 1, 15),
            date(2024, 6, 15),
            Some(PaymentCycle::Monthly),
        );

        assert_eq!(periods[0].period_start, date(2024, 1, 1));
        assert_eq!(periods[0].period_end, date(2024, 1, 31));
        assert_eq!(periods[1].period_end, date(2024, 2, 29));
        // последний период обрезан датой окончания
        assert_eq!(periods[5].period_start, date(2024, 6, 1));
        assert_eq!(periods[5].period_end, date(2024, 6, 15));
    }

    #[test]
    fn test_quarterly_schedule_count() {
        let periods = build_schedule(
            date(2024, 1, 1),
            date(2024, 12, 31),
            Some(PaymentCycle::Quarterly),
        );
        assert_eq!(periods.len(), 4);
        assert_eq!(periods[3].due_date, date(2024, 10, 1));
        assert_eq!(periods[3].period_end, date(2024, 12, 31));
    }

    #[test]
    fn test_yearly_schedule_count() {
        let periods = build_schedule(
            date(2024, 3, 1),
            date(2026, 2, 28),
            Some(PaymentCycle::Yearly),
        );
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[1].due_date, date(2025, 3, 1));
    }

    #[test]
    fn test_missing_cycle_defaults_to_monthly() {
        let periods = build_schedule(date(2024, 1, 1), date(2024, 3, 31), None);
        assert_eq!(periods.len(), 3);
    }

    #[test]
    fn test_single_day_contract_yields_one_period() {
        let periods = build_schedule(
            date(2024, 5, 10),
            date(2024, 5, 10),
            Some(PaymentCycle::Monthly),
        );
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].due_date, date(2024, 5, 10));
        assert_eq!(periods[0].period_end, date(2024, 5, 10));
    }

    #[test]
    fn test_month_end_start_clamps_forward() {
        // chrono прижимает 31-е число к концу короткого месяца
        let periods = build_schedule(
            date(2024, 1, 31),
            date(2024, 3, 31),
            Some(PaymentCycle::Monthly),
        );
        let due_dates: Vec<NaiveDate> = periods.iter().map(|p| p.due_date).collect();
        assert_eq!(
            due_dates,
            vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 29)]
        );
    }
}
