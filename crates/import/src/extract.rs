use sankeyfin_core::{Money, Transaction};

use crate::table::Record;

const CATEGORY_FIELD: &str = "Category";
const AMOUNT_FIELD: &str = "Amount";

/// Maps a record to a transaction. Records with a blank, unparsable or zero
/// amount yield `None`; they are skipped rather than reported.
pub fn extract_transaction(record: &Record) -> Option<Transaction> {
    let amount = Money::parse(record.get_ignore_case(AMOUNT_FIELD))?;
    Transaction::new(record.get_ignore_case(CATEGORY_FIELD), amount)
}

pub fn extract_transactions(records: &[Record]) -> Vec<Transaction> {
    let transactions: Vec<Transaction> = records.iter().filter_map(extract_transaction).collect();
    tracing::debug!(
        records = records.len(),
        transactions = transactions.len(),
        skipped = records.len() - transactions.len(),
        "extracted transactions"
    );
    transactions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse;

    fn extract(text: &str) -> Vec<Transaction> {
        extract_transactions(parse(text).unwrap().records())
    }

    #[test]
    fn extracts_path_and_magnitude() {
        let txs = extract("Category,Amount\nAuto:Gas,\"$1,234.50\"\nIncome,(500)\n");
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].segments(), &["Auto", "Gas"]);
        assert_eq!(txs[0].value(), Money::from_cents(123450));
        assert_eq!(txs[1].value(), Money::from_cents(50000));
    }

    #[test]
    fn field_names_are_case_insensitive() {
        let txs = extract("CATEGORY,amount\nTax,5\n");
        assert_eq!(txs[0].top_level(), "Tax");
    }

    #[test]
    fn skips_blank_garbage_and_zero_amounts() {
        let txs = extract("Category,Amount\nA,\nB,n/a\nC,0.00\nD,$0\nE,7\n");
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].top_level(), "E");
    }

    #[test]
    fn missing_category_becomes_uncategorized() {
        let txs = extract("Payee,Amount\nShell,-40\n");
        assert_eq!(txs[0].segments(), &["Uncategorized"]);
    }

    #[test]
    fn missing_amount_column_yields_nothing() {
        assert!(extract("Category,Memo\nAuto,hi\n").is_empty());
    }
}
