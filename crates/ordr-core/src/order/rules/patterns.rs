//! Common regex patterns for purchase-order extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Dates
    pub static ref DATE_MONTH_NAME: Regex = Regex::new(
        r"\b([A-Za-z]{3,9})\.?\s*(\d{1,2})(?:st|nd|rd|th)?(?:,\s*|\s+)(\d{4})\b"
    ).unwrap();

    pub static ref DATE_DAY_MONTH_NAME: Regex = Regex::new(
        r"\b(\d{1,2})(?:st|nd|rd|th)?[\s\-]+([A-Za-z]{3,9})\.?,?[\s\-]+(\d{4})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    /// A whole cell or token that is a numeric date.
    pub static ref DATE_TOKEN: Regex = Regex::new(
        r"^\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}$"
    ).unwrap();

    // Amounts
    pub static ref CURRENCY_MARKER: Regex = Regex::new(
        r"€|\$|£|(?i:\b(?:EUR|USD|GBP)\b)"
    ).unwrap();

    pub static ref PER_UNIT: Regex = Regex::new(
        r"(?i)\bper\s+([\d.,]+)"
    ).unwrap();

    pub static ref UNIT_WORDS: Regex = Regex::new(
        r"(?i)\b(?:pcs|pc|each|ea|units?)\b\.?"
    ).unwrap();

    pub static ref NUMBER_TOKEN: Regex = Regex::new(
        r"[-+]?\d[\d.,]*"
    ).unwrap();

    // Wefabricate
    pub static ref WF_ITEM_NUMBER: Regex = Regex::new(r"^\d+$").unwrap();

    pub static ref WF_IDENTIFIER: Regex = Regex::new(r"^\d{4}-\d{4}-\d{4}$").unwrap();

    /// A part-code-looking cell: an attempted identifier, valid or not.
    pub static ref WF_IDENTIFIER_SHAPE: Regex = Regex::new(
        r"^(?:\d[\d\-]*|[A-Za-z0-9]+(?:-[A-Za-z0-9]+)+)$"
    ).unwrap();

    pub static ref WF_SCHEDULE_MARKER: Regex = Regex::new(r"(?i)schedule\s+lines?\s*:").unwrap();

    /// A cell that starts with a date such as "Oct 7, 2025".
    pub static ref WF_SCHEDULE_DATE: Regex = Regex::new(
        r"^[A-Za-z]+\.?\s*\d{1,2},\s*\d{4}"
    ).unwrap();

    pub static ref WF_PO_NUMBER: Regex = Regex::new(
        r"(?i)purchase\s+order[^\d\n]*(\d+)"
    ).unwrap();

    pub static ref WF_PO_FALLBACK: Regex = Regex::new(r"\b(\d{10})\b").unwrap();

    pub static ref WF_CREATED_ON: Regex = Regex::new(
        r"(?i)created\s+on:?\s*([A-Za-z]+\s*\d{1,2},\s*\d{4})"
    ).unwrap();

    pub static ref WF_CONTACT_PERSON: Regex = Regex::new(
        r"(?im)contact\s+person[:\t ]*(.*)$"
    ).unwrap();

    // Centurion
    pub static ref CENTURION_PO_NUMBER: Regex = Regex::new(r"\bPO[\-\s#:]*(\d+)").unwrap();

    pub static ref CENTURION_NUMBER: Regex = Regex::new(r"Number[:\s]*([A-Z0-9\-]+)").unwrap();

    pub static ref CENTURION_DATE: Regex = Regex::new(
        r"Date[:\s]*(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4})"
    ).unwrap();

    pub static ref CENTURION_CURRENCY: Regex = Regex::new(r"Currency[:\s]*(\w{3})").unwrap();

    pub static ref CENTURION_ITEM_LINE: Regex = Regex::new(r"^\d+\s").unwrap();

    pub static ref CENTURION_ITEM_WITH_TOKEN: Regex = Regex::new(r"^\d+\s\S+").unwrap();

    pub static ref CENTURION_PN_TAIL: Regex = Regex::new(r"^\d{3}").unwrap();

    // MagicFX
    pub static ref MFX_PO_NUMBER: Regex = Regex::new(
        r"(?i)purchase\s+order\s+no\.?\s*(\d+)"
    ).unwrap();

    pub static ref MFX_DATE: Regex = Regex::new(r"Date\s+(\d{2}-\d{2}-\d{4})").unwrap();

    /// Two product codes open every item block.
    pub static ref MFX_ITEM_START: Regex = Regex::new(
        r"^(PROTO\s*\([^)]*\)|VARIOUS)\s+(PROTO\s*\([^)]*\)|VARIOUS)"
    ).unwrap();

    pub static ref MFX_SINGLE_LINE: Regex = Regex::new(
        r"^(.+?)\s+(\d{2}-\d{2}-\d{4})\s+(\d+)\s*(?:pcs|pc)?\s+([\d.,]+)\s+([\d.,]+)$"
    ).unwrap();

    pub static ref MFX_DATE_LINE: Regex = Regex::new(r"^(\d{2}-\d{2}-\d{4})\s+").unwrap();

    pub static ref MFX_QTY_PRICE_TOTAL: Regex = Regex::new(
        r"^(\d+)\s*(?:pcs|pc)?\s+([\d.,]+)\s+([\d.,]+)$"
    ).unwrap();

    pub static ref MFX_DATE_CELL: Regex = Regex::new(r"^\d{2}-\d{2}-\d{4}$").unwrap();

    // Misc
    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wf_identifier() {
        assert!(WF_IDENTIFIER.is_match("1234-5678-9012"));
        assert!(!WF_IDENTIFIER.is_match("1234-5678-901"));
        assert!(WF_IDENTIFIER_SHAPE.is_match("1234-5678-901"));
        assert!(!WF_IDENTIFIER_SHAPE.is_match("Bracket"));
        assert!(WF_IDENTIFIER_SHAPE.is_match("ABCD-5678-9012"));
        assert!(!WF_IDENTIFIER_SHAPE.is_match("Cover plate"));
    }

    #[test]
    fn test_centurion_item_line() {
        assert!(CENTURION_ITEM_LINE.is_match("1 510-000- ARMIS"));
        assert!(!CENTURION_ITEM_LINE.is_match("Line Item Description"));
    }

    #[test]
    fn test_mfx_item_start() {
        assert!(MFX_ITEM_START.is_match("PROTO (A1) VARIOUS Confetti cannon"));
        assert!(MFX_ITEM_START.is_match("VARIOUS VARIOUS Streamers"));
        assert!(!MFX_ITEM_START.is_match("Code Description"));
    }

    #[test]
    fn test_mfx_single_line() {
        let caps = MFX_SINGLE_LINE
            .captures("Confetti cannon 01-10-2025 5 pcs 512,60 2.563,00")
            .unwrap();
        assert_eq!(&caps[1], "Confetti cannon");
        assert_eq!(&caps[2], "01-10-2025");
        assert_eq!(&caps[3], "5");
        assert_eq!(&caps[4], "512,60");
        assert_eq!(&caps[5], "2.563,00");
    }

    #[test]
    fn test_contact_person_stays_on_line() {
        let caps = WF_CONTACT_PERSON
            .captures("Contact Person: Jane Doe\nPhone: 123")
            .unwrap();
        assert_eq!(caps[1].trim(), "Jane Doe");
    }
}
