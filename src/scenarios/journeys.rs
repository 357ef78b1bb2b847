use super::analysis::{
    analyze_normalized, count_occurrences, Expectations, BENIGN_PHRASES, PRODUCT_ADDED,
    PRODUCT_DELETED, PRODUCT_LIST, PRODUCT_MODIFIED, REGRESSION_SIGNATURES,
};
use super::ids::{extract_product_ids, newest_product_id};
use super::session::{Session, TEST_MODE_FLAG, TEST_SMOKE_FLAG};
use super::transcript::Transcript;
use super::{ScenarioContext, ScenarioId, ScenarioVerdict};
use anyhow::Result;

const PRODUCT_NAME: &str = "Clavier";
const PRODUCT_QUANTITY: u32 = 25;
const PRODUCT_PRICE: &str = "49.99";

/// Normalized labels a listing must show for each product.
const LISTING_FIELDS: &[&str] = &[PRODUCT_LIST, "id", "nom", "quantite", "prix"];

pub(super) fn run(id: ScenarioId, context: &ScenarioContext) -> Result<ScenarioVerdict> {
    match id {
        ScenarioId::ThemeInit => theme_init(context),
        ScenarioId::Smoke => smoke(context),
        ScenarioId::AddProduct => add_product(context),
        ScenarioId::ListProducts => list_products(context),
        ScenarioId::ModifyProduct => modify_product(context),
        ScenarioId::DeleteProduct => delete_product(context),
        ScenarioId::FullJourney => full_journey(context),
        ScenarioId::Regression => regression(context),
    }
}

fn test_mode_session(
    context: &ScenarioContext,
    id: ScenarioId,
    label: &str,
    transcript: &Transcript,
) -> Result<Session> {
    context.aut.session(
        label,
        &[TEST_MODE_FLAG],
        Some(transcript),
        context.timeout_for(id),
    )
}

fn checked(session: &Session, label: &str, expectations: &Expectations) -> Vec<String> {
    let mut failures = session.exit_failures(label);
    failures.extend(
        analyze_normalized(&session.normalized, expectations)
            .failures()
            .into_iter()
            .map(|failure| format!("{label}: {failure}")),
    );
    failures
}

fn theme_init(context: &ScenarioContext) -> Result<ScenarioVerdict> {
    let session = context.aut.session(
        "theme_init",
        &[TEST_MODE_FLAG],
        None,
        context.timeout_for(ScenarioId::ThemeInit),
    )?;
    Ok(ScenarioVerdict::from_failures(
        session.exit_failures("theme_init"),
        vec!["Theme initialization passed: binary exited cleanly.".to_string()],
    ))
}

/// Theme initialization gate for journeys that depend on it; `Some` is the
/// verdict to return without touching the database.
fn theme_prerequisite(context: &ScenarioContext) -> Result<Option<ScenarioVerdict>> {
    match theme_init(context)? {
        ScenarioVerdict::Failed(mut failures) => {
            failures.insert(0, "theme initialization failed".to_string());
            Ok(Some(ScenarioVerdict::Failed(failures)))
        }
        _ => Ok(None),
    }
}

fn smoke(context: &ScenarioContext) -> Result<ScenarioVerdict> {
    let session = context.aut.session(
        "smoke",
        &[TEST_SMOKE_FLAG],
        None,
        context.timeout_for(ScenarioId::Smoke),
    )?;
    Ok(ScenarioVerdict::from_failures(
        session.exit_failures("smoke"),
        vec!["Binary opened and exited cleanly.".to_string()],
    ))
}

fn add_product(context: &ScenarioContext) -> Result<ScenarioVerdict> {
    let transcript = Transcript::new()
        .add_product(PRODUCT_NAME, PRODUCT_QUANTITY, PRODUCT_PRICE)
        .quit();
    let session = test_mode_session(context, ScenarioId::AddProduct, "add", &transcript)?;
    let failures = checked(&session, "add", &Expectations::requiring(&[PRODUCT_ADDED]));
    Ok(ScenarioVerdict::from_failures(
        failures,
        vec![format!(
            "Produit ajouté avec succès : {PRODUCT_NAME} x{PRODUCT_QUANTITY} à {PRODUCT_PRICE}."
        )],
    ))
}

/// A product created in its own session, with the id read back from a listing.
struct SeededProduct {
    id: Option<u32>,
    failures: Vec<String>,
}

fn seed_product(context: &ScenarioContext, id: ScenarioId) -> Result<SeededProduct> {
    let transcript = Transcript::new()
        .add_product(PRODUCT_NAME, PRODUCT_QUANTITY, PRODUCT_PRICE)
        .list_products()
        .quit();
    let session = test_mode_session(context, id, "seed", &transcript)?;
    let mut failures = checked(
        &session,
        "seed",
        &Expectations::requiring(&[PRODUCT_ADDED, PRODUCT_LIST]),
    );
    let product_id = newest_product_id(&session.normalized);
    if product_id.is_none() {
        failures.push("seed: no product id found in listing".to_string());
    }
    tracing::debug!(product_id = ?product_id, "seeded product");
    Ok(SeededProduct {
        id: product_id,
        failures,
    })
}

fn list_products(context: &ScenarioContext) -> Result<ScenarioVerdict> {
    if let Some(verdict) = theme_prerequisite(context)? {
        return Ok(verdict);
    }
    let seeded = seed_product(context, ScenarioId::ListProducts)?;
    let Some(product_id) = seeded.id.filter(|_| seeded.failures.is_empty()) else {
        return Ok(ScenarioVerdict::Failed(seeded.failures));
    };

    let transcript = Transcript::new().list_products().quit();
    let session = test_mode_session(context, ScenarioId::ListProducts, "list", &transcript)?;
    let mut failures = checked(&session, "list", &Expectations::requiring(LISTING_FIELDS));
    if !extract_product_ids(&session.normalized).contains(&product_id) {
        failures.push(format!("list: product {product_id} missing from listing"));
    }
    Ok(ScenarioVerdict::from_failures(
        failures,
        vec![
            "Liste des produits vérifiée : tous les champs du produit sont présents.".to_string(),
        ],
    ))
}

fn modify_product(context: &ScenarioContext) -> Result<ScenarioVerdict> {
    let seeded = seed_product(context, ScenarioId::ModifyProduct)?;
    let Some(product_id) = seeded.id.filter(|_| seeded.failures.is_empty()) else {
        return Ok(ScenarioVerdict::Failed(seeded.failures));
    };

    let transcript = Transcript::new()
        .modify_product(product_id, "SuperModif", 99_999, "999999.99")
        .list_products()
        .quit();
    let session = test_mode_session(context, ScenarioId::ModifyProduct, "modify", &transcript)?;
    let mut failures = checked(
        &session,
        "modify",
        &Expectations::requiring(&[PRODUCT_MODIFIED]),
    );
    if !session.normalized.contains("supermodif") {
        failures.push(format!("modify: new name not listed for product {product_id}"));
    }
    Ok(ScenarioVerdict::from_failures(
        failures,
        vec![format!("Test réussi : Modification réussie pour l'ID {product_id}.")],
    ))
}

fn delete_product(context: &ScenarioContext) -> Result<ScenarioVerdict> {
    if let Some(verdict) = theme_prerequisite(context)? {
        return Ok(verdict);
    }
    let seeded = seed_product(context, ScenarioId::DeleteProduct)?;
    let Some(product_id) = seeded.id.filter(|_| seeded.failures.is_empty()) else {
        return Ok(ScenarioVerdict::Failed(seeded.failures));
    };

    let transcript = Transcript::new().delete_product(product_id).quit();
    let session = test_mode_session(context, ScenarioId::DeleteProduct, "delete", &transcript)?;
    let mut failures = checked(
        &session,
        "delete",
        &Expectations::requiring(&[PRODUCT_DELETED]),
    );
    let confirmations = count_occurrences(&session.normalized, PRODUCT_DELETED);
    if confirmations > 1 {
        failures.push(format!(
            "delete: {confirmations} deletion confirmations for product {product_id}, expected 1"
        ));
    }

    let transcript = Transcript::new().list_products().quit();
    let after = test_mode_session(context, ScenarioId::DeleteProduct, "verify", &transcript)?;
    failures.extend(after.exit_failures("verify"));
    if extract_product_ids(&after.normalized).contains(&product_id) {
        failures.push(format!("verify: product {product_id} still listed"));
    }

    Ok(ScenarioVerdict::from_failures(
        failures,
        vec![format!("ID {product_id}: Deleted")],
    ))
}

fn full_journey(context: &ScenarioContext) -> Result<ScenarioVerdict> {
    let first = Transcript::new()
        .add_product(PRODUCT_NAME, PRODUCT_QUANTITY, PRODUCT_PRICE)
        .list_and_return()
        .quit();
    let opening = test_mode_session(context, ScenarioId::FullJourney, "journey:add", &first)?;
    let mut failures = opening.exit_failures("journey:add");
    let Some(product_id) = newest_product_id(&opening.normalized) else {
        failures.push("journey:add: no product id found in listing".to_string());
        return Ok(ScenarioVerdict::Failed(failures));
    };

    let second = Transcript::new()
        .list_and_return()
        .modify_product(product_id, "Clavier RGB", 50, "59.99")
        .delete_product(product_id)
        .quit();
    let closing = test_mode_session(context, ScenarioId::FullJourney, "journey:edit", &second)?;
    failures.extend(closing.exit_failures("journey:edit"));

    let combined = format!("{}\n{}", opening.normalized, closing.normalized);
    let analysis = analyze_normalized(
        &combined,
        &Expectations::requiring(&[
            PRODUCT_ADDED,
            PRODUCT_LIST,
            PRODUCT_MODIFIED,
            PRODUCT_DELETED,
        ]),
    );
    failures.extend(analysis.failures());

    Ok(ScenarioVerdict::from_failures(
        failures,
        vec![format!(
            "Parcours complet validé : ajout, liste, modification et suppression \
             confirmés (ID {product_id})."
        )],
    ))
}

fn regression(context: &ScenarioContext) -> Result<ScenarioVerdict> {
    // Listing followed by a bare Enter used to crash the menu loop.
    let transcript = Transcript::new().list_and_return().quit();
    let session = test_mode_session(context, ScenarioId::Regression, "regression", &transcript)?;
    let expectations = Expectations {
        required: Vec::new(),
        forbidden: REGRESSION_SIGNATURES.to_vec(),
        allowed: BENIGN_PHRASES.to_vec(),
    };
    let failures = checked(&session, "regression", &expectations);
    if !session.normalized.contains(PRODUCT_LIST) {
        tracing::warn!("listing header not found; verify empty-listing handling");
    }
    Ok(ScenarioVerdict::from_failures(
        failures,
        vec!["Cas de bug résolu : retour au menu après une entrée vide.".to_string()],
    ))
}
