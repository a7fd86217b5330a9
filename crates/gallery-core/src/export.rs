// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! CSV export of an event's token holders

use api_client::Token;

use crate::{enrichment::EnrichmentStatus, format::utc_date_full};

/// Column headers, in output order
pub const CSV_HEADER: [&str; 6] = ["ID", "Collection", "ENS", "Minting Date", "Tx Count", "Power"];

/// Rendered export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// Download file name
    pub filename: String,
    /// Download label
    pub label: &'static str,
    /// Sum of the `Power` column
    pub power: u64,
    /// Number of data rows
    pub rows: usize,
    /// CSV text including the header line
    pub body: String,
    /// Enrichment status the names came from
    pub status: EnrichmentStatus,
}

/// Download label for an export produced with `status`
pub const fn download_label(status: EnrichmentStatus) -> &'static str {
    if status.is_enriched() {
        "Download CSV"
    } else {
        "Download CSV (without ENS)"
    }
}

/// Sum of owners' token counts over `tokens`
pub fn total_power(tokens: &[Token]) -> u64 {
    tokens.iter().map(|token| token.owner.tokens_owned).sum()
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_record<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line = fields
        .into_iter()
        .map(|field| escape(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push('\n');
}

/// Render `tokens` as CSV for the event `event_name`
pub fn render_csv(event_name: &str, tokens: &[Token], status: EnrichmentStatus) -> CsvExport {
    let mut body = String::new();
    push_record(&mut body, CSV_HEADER);

    for token in tokens {
        push_record(
            &mut body,
            [
                token.id.to_string(),
                format!("{:#x}", token.owner.id),
                token.owner.ens.clone().unwrap_or_default(),
                utc_date_full(token.created.as_deref()),
                token.transfer_count.to_string(),
                token.owner.tokens_owned.to_string(),
            ],
        );
    }

    CsvExport {
        filename: format!("{event_name}.csv"),
        label: download_label(status),
        power: total_power(tokens),
        rows: tokens.len(),
        body,
        status,
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;
    use api_client::Account;

    use super::*;

    fn token(id: u64, owned: u64, ens: Option<&str>) -> Token {
        Token {
            id,
            owner: Account {
                id: Address::repeat_byte(0xab),
                tokens_owned: owned,
                tokens_minted: 0,
                ens: ens.map(ToString::to_string),
            },
            created: Some("2022-10-18T12:00:00Z".to_string()),
            transfer_count: 2,
            event_id: Some(1),
        }
    }

    #[test]
    fn power_sums_owned_counts() {
        let tokens = vec![token(1, 5, None), token(2, 0, None), token(3, 3, None)];
        let export = render_csv("Devcon", &tokens, EnrichmentStatus::Ready);
        assert_eq!(export.power, 8);
        assert_eq!(export.rows, 3);
    }

    #[test]
    fn rows_follow_header_order() {
        let export = render_csv(
            "Devcon",
            &[token(7, 4, Some("alice.eth"))],
            EnrichmentStatus::Ready,
        );
        let lines: Vec<&str> = export.body.lines().collect();
        assert_eq!(lines[0], "ID,Collection,ENS,Minting Date,Tx Count,Power");
        assert_eq!(
            lines[1],
            format!(
                "7,0x{},alice.eth,\"Tue, 18 Oct 2022 12:00:00 GMT\",2,4",
                "ab".repeat(20)
            )
        );
        assert_eq!(export.filename, "Devcon.csv");
        assert_eq!(export.label, "Download CSV");
    }

    #[test]
    fn unenriched_exports_are_labelled() {
        let export = render_csv("Empty", &[], EnrichmentStatus::Failed);
        assert_eq!(export.label, "Download CSV (without ENS)");
        assert_eq!(export.power, 0);
        assert_eq!(export.body, "ID,Collection,ENS,Minting Date,Tx Count,Power\n");
        assert_eq!(
            download_label(EnrichmentStatus::ReadyWithoutEnrichment),
            "Download CSV (without ENS)"
        );
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("say \"gm\""), "\"say \"\"gm\"\"\"");
    }
}
