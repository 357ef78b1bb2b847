//! Product id extraction from a listing screen.
use regex::Regex;

/// Ids outside this range are treated as parse noise.
pub const MIN_PRODUCT_ID: u32 = 1;
pub const MAX_PRODUCT_ID: u32 = 9_999;

/// Ids of every `id:` line in normalized listing output, in listing order.
pub fn extract_product_ids(normalized: &str) -> Vec<u32> {
    let Ok(re) = Regex::new(r"^id:\s*(\d+)") else {
        return Vec::new();
    };
    normalized
        .lines()
        .filter_map(|line| re.captures(line.trim_start()))
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .filter(|id| (MIN_PRODUCT_ID..=MAX_PRODUCT_ID).contains(id))
        .collect()
}

/// The most recently listed product, i.e. the one a scenario just created.
pub fn newest_product_id(normalized: &str) -> Option<u32> {
    extract_product_ids(normalized).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    const LISTING: &str = "Votre choix : === Liste des produits ===\n\
        ID: 1 | Nom: Clavier | Quantité: 25 | Prix: 49.99\n\
        ID: 4 | Nom: Souris | Quantité: 3 | Prix: 9.90\n\
        Votre choix : Au revoir !\n";

    #[test]
    fn extracts_ids_in_listing_order() {
        let normalized = normalize(LISTING);
        assert_eq!(extract_product_ids(&normalized), [1, 4]);
        assert_eq!(newest_product_id(&normalized), Some(4));
    }

    #[test]
    fn ignores_lines_not_starting_with_prefix() {
        let normalized = normalize("Produit ID: 3 supprimé\n  id:7 | nom: x\nidentifiant: 9\n");
        assert_eq!(extract_product_ids(&normalized), [7]);
    }

    #[test]
    fn drops_ids_outside_sanity_range() {
        let normalized = "id: 0\nid: 10000\nid: 99999999999\nid: 12\n";
        assert_eq!(extract_product_ids(normalized), [12]);
    }

    #[test]
    fn empty_listing_has_no_newest_id() {
        assert_eq!(newest_product_id("=== liste des produits ===\naucun produit.\n"), None);
    }
}
