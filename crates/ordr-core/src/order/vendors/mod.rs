//! Vendor grammars.

mod centurion;
mod magicfx;
mod wefabricate;

pub use centurion::CenturionAdapter;
pub use magicfx::MagicFxAdapter;
pub use wefabricate::WefabricateAdapter;

use super::VendorAdapter;
use crate::models::Vendor;
use crate::pdf::TokenizedPage;

/// The grammar for `vendor`.
pub fn adapter_for(vendor: Vendor) -> Box<dyn VendorAdapter> {
    match vendor {
        Vendor::Wefabricate => Box::new(WefabricateAdapter::new()),
        Vendor::Centurion => Box::new(CenturionAdapter::new()),
        Vendor::MagicFx => Box::new(MagicFxAdapter::new()),
    }
}

/// Text of the first page, or `""`.
fn first_page(pages: &[TokenizedPage]) -> &str {
    pages.first().map(|p| p.text.as_str()).unwrap_or("")
}

/// Try `find` on the first page, then on the whole document.
fn first_page_then_all<T>(pages: &[TokenizedPage], find: impl Fn(&str) -> Option<T>) -> Option<T> {
    find(first_page(pages)).or_else(|| {
        let all = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        find(&all)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_for_every_vendor() {
        for vendor in Vendor::ALL {
            assert_eq!(adapter_for(vendor).vendor(), vendor);
        }
    }
}
