//! Minimal gestion_stock look-alike: same menu, prompts, and confirmations,
//! backed by a tab-separated `stockt.db` in the working directory.
use anyhow::{Context, Result};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DATABASE_FILE: &str = "stockt.db";
const BAD_NUMBER: &str = "Entrée invalide. Veuillez entrer un entier non négatif.";

#[derive(Debug, Clone, PartialEq)]
struct Product {
    id: u32,
    name: String,
    quantity: u32,
    price: f64,
}

struct Store {
    path: PathBuf,
    products: Vec<Product>,
}

impl Store {
    fn open(path: &Path) -> Result<Store> {
        if !path.exists() {
            fs::write(path, "").with_context(|| format!("create {}", path.display()))?;
        }
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let products = text.lines().filter_map(parse_row).collect();
        Ok(Store {
            path: path.to_path_buf(),
            products,
        })
    }

    fn save(&self) -> Result<()> {
        let mut text = String::new();
        for product in &self.products {
            text.push_str(&format!(
                "{}\t{}\t{}\t{:.2}\n",
                product.id, product.name, product.quantity, product.price
            ));
        }
        fs::write(&self.path, text).with_context(|| format!("write {}", self.path.display()))
    }

    fn next_id(&self) -> u32 {
        self.products.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }

    fn find_mut(&mut self, id: u32) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }
}

fn parse_row(line: &str) -> Option<Product> {
    let mut fields = line.split('\t');
    Some(Product {
        id: fields.next()?.parse().ok()?,
        name: fields.next()?.to_string(),
        quantity: fields.next()?.parse().ok()?,
        price: fields.next()?.parse().ok()?,
    })
}

struct Console<R> {
    input: R,
}

impl<R: BufRead> Console<R> {
    /// Print `prompt` and read one line; `None` at end of input.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{prompt}");
        io::stdout().flush().context("flush stdout")?;
        let mut line = String::new();
        if self.input.read_line(&mut line).context("read stdin")? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

fn main() -> Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let test_mode = args.iter().any(|arg| arg == "--test-mode");
    if args.iter().any(|arg| arg == "--test-smoke") {
        println!("gestion_stock: démarrage rapide terminé.");
        return Ok(ExitCode::SUCCESS);
    }

    let mut store = Store::open(Path::new(DATABASE_FILE))?;
    let stdin = io::stdin();
    let mut console = Console {
        input: stdin.lock(),
    };
    run_menu(&mut store, &mut console, test_mode)?;
    Ok(ExitCode::SUCCESS)
}

fn run_menu<R: BufRead>(
    store: &mut Store,
    console: &mut Console<R>,
    test_mode: bool,
) -> Result<()> {
    loop {
        println!();
        println!("=== Gestion de stock ===");
        println!("1. Ajouter un produit");
        println!("2. Lister les produits");
        println!("3. Supprimer un produit");
        println!("4. Modifier un produit");
        println!("0. Quitter");
        let Some(choice) = console.ask("Votre choix : ")? else {
            return Ok(());
        };
        let keep_going = match choice.as_str() {
            "1" => add(store, console)?,
            "2" => list(store, console, test_mode)?,
            "3" => delete(store, console)?,
            "4" => modify(store, console)?,
            "0" => {
                println!("Au revoir !");
                return Ok(());
            }
            _ => {
                println!("{BAD_NUMBER}");
                true
            }
        };
        if !keep_going {
            return Ok(());
        }
    }
}

/// Each action returns `false` when input ran out mid-dialog.
fn add<R: BufRead>(store: &mut Store, console: &mut Console<R>) -> Result<bool> {
    let Some(name) = console.ask("Nom : ")? else {
        return Ok(false);
    };
    let Some(quantity) = ask_quantity(console, "Quantité : ")? else {
        return Ok(false);
    };
    let Some(price) = ask_price(console, "Prix : ")? else {
        return Ok(false);
    };
    let (Some(quantity), Some(price)) = (quantity, price) else {
        return Ok(true);
    };
    let id = store.next_id();
    store.products.push(Product {
        id,
        name,
        quantity,
        price,
    });
    store.save()?;
    println!("Produit ajouté avec succès.");
    Ok(true)
}

fn list<R: BufRead>(store: &Store, console: &mut Console<R>, test_mode: bool) -> Result<bool> {
    println!("=== Liste des produits ===");
    if store.products.is_empty() {
        println!("Aucun produit.");
    }
    for product in &store.products {
        println!(
            "ID: {} | Nom: {} | Quantité: {} | Prix: {:.2}",
            product.id, product.name, product.quantity, product.price
        );
    }
    if test_mode {
        return Ok(true);
    }
    Ok(console.ask("Appuyez sur Entrée pour continuer...")?.is_some())
}

fn delete<R: BufRead>(store: &mut Store, console: &mut Console<R>) -> Result<bool> {
    let Some(id) = ask_quantity(console, "ID du produit à supprimer : ")? else {
        return Ok(false);
    };
    let Some(id) = id else {
        return Ok(true);
    };
    if store.find_mut(id).is_none() {
        println!("Produit inexistant.");
        return Ok(true);
    }
    let Some(answer) = console.ask("Confirmer la suppression (o/n) : ")? else {
        return Ok(false);
    };
    if answer.eq_ignore_ascii_case("o") {
        store.products.retain(|p| p.id != id);
        store.save()?;
        println!("Produit supprimé.");
    } else {
        println!("Suppression annulée.");
    }
    Ok(true)
}

fn modify<R: BufRead>(store: &mut Store, console: &mut Console<R>) -> Result<bool> {
    let Some(id) = ask_quantity(console, "ID du produit à modifier : ")? else {
        return Ok(false);
    };
    let Some(id) = id else {
        return Ok(true);
    };
    if store.find_mut(id).is_none() {
        println!("Produit inexistant.");
        return Ok(true);
    }
    let Some(name) = console.ask("Nouveau nom : ")? else {
        return Ok(false);
    };
    let Some(quantity) = ask_quantity(console, "Nouvelle quantité : ")? else {
        return Ok(false);
    };
    let Some(price) = ask_price(console, "Nouveau prix : ")? else {
        return Ok(false);
    };
    let (Some(quantity), Some(price)) = (quantity, price) else {
        return Ok(true);
    };
    if let Some(product) = store.find_mut(id) {
        product.name = name;
        product.quantity = quantity;
        product.price = price;
    }
    store.save()?;
    println!("Produit modifié avec succès.");
    Ok(true)
}

/// Outer `None` at end of input, inner `None` for an unparsable answer.
fn ask_quantity<R: BufRead>(
    console: &mut Console<R>,
    prompt: &str,
) -> Result<Option<Option<u32>>> {
    let Some(answer) = console.ask(prompt)? else {
        return Ok(None);
    };
    let value = answer.parse::<u32>().ok();
    if value.is_none() {
        println!("{BAD_NUMBER}");
    }
    Ok(Some(value))
}

fn ask_price<R: BufRead>(console: &mut Console<R>, prompt: &str) -> Result<Option<Option<f64>>> {
    let Some(answer) = console.ask(prompt)? else {
        return Ok(None);
    };
    let value = answer
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price >= 0.0);
    if value.is_none() {
        println!("Prix non reconnu.");
    }
    Ok(Some(value))
}
