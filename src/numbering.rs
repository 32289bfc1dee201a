use sqlx::PgExecutor;

/// Document series that draw from the per-company counters table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PaymentVoucher,
    ReceiptVoucher,
    SalesInvoice,
    Order,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentVoucher => "payment_voucher",
            Self::ReceiptVoucher => "receipt_voucher",
            Self::SalesInvoice => "sales_invoice",
            Self::Order => "order",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Self::PaymentVoucher => "PV",
            Self::ReceiptVoucher => "RV",
            Self::SalesInvoice => "INV",
            Self::Order => "ORD",
        }
    }

    pub fn format_number(&self, value: i64) -> String {
        format!("{}-{:06}", self.prefix(), value)
    }
}

/// Atomically increments and returns the counter for one document series.
///
/// A single upsert-returning statement, so two concurrent submissions can
/// never read the same value (the read-count-then-insert pattern this
/// replaces raced under load). Callers pass their open transaction as the
/// executor when the number must commit with the document itself.
pub async fn next_number<'e, E>(
    executor: E,
    company_id: i64,
    kind: DocumentKind,
) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO document_counters (company_id, kind, value) VALUES ($1, $2, 1) \
         ON CONFLICT (company_id, kind) \
         DO UPDATE SET value = document_counters.value + 1 \
         RETURNING document_counters.value",
    )
    .bind(company_id)
    .bind(kind.as_str())
    .fetch_one(executor)
    .await
}

/// Read-only preview of the next number in a series. Not reserved: the
/// metadata endpoints show it, the save path draws the real one.
pub async fn peek_next_number<'e, E>(
    executor: E,
    company_id: i64,
    kind: DocumentKind,
) -> Result<String, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let current: Option<i64> = sqlx::query_scalar(
        "SELECT value FROM document_counters WHERE company_id = $1 AND kind = $2",
    )
    .bind(company_id)
    .bind(kind.as_str())
    .fetch_optional(executor)
    .await?;

    Ok(kind.format_number(current.unwrap_or(0) + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_prefix_and_padding() {
        assert_eq!(DocumentKind::PaymentVoucher.format_number(1), "PV-000001");
        assert_eq!(DocumentKind::ReceiptVoucher.format_number(42), "RV-000042");
        assert_eq!(DocumentKind::SalesInvoice.format_number(999999), "INV-999999");
        assert_eq!(DocumentKind::Order.format_number(1000000), "ORD-1000000");
    }

    #[test]
    fn counter_kinds_are_distinct() {
        let kinds = [
            DocumentKind::PaymentVoucher,
            DocumentKind::ReceiptVoucher,
            DocumentKind::SalesInvoice,
            DocumentKind::Order,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in kinds.iter().skip(i + 1) {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }
}
