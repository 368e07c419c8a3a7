//! Interactive session: login page, dashboard, inventory and billing.
//!
//! All state (session, inventory, invoice draft) lives in [`App`] for as long
//! as the shell runs and is gone when it exits.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

use crate::auth::{sign_in_instructions, Session};
use crate::config::Config;
use crate::error::{HahnemannError, Result};
use crate::input::Field;
use crate::inventory::{Inventory, InventoryItem, ItemDraft};
use crate::invoice::{
    export_invoice, format_money, grand_total, InvoiceDraft, InvoiceLine, LineDraft,
    WatermarkMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Dashboard,
    Inventory,
    Billing,
}

impl View {
    fn name(self) -> &'static str {
        match self {
            View::Login => "login",
            View::Dashboard => "dashboard",
            View::Inventory => "inventory",
            View::Billing => "billing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything one session knows.
#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub view: View,
    pub inventory: Inventory,
    pub draft: InvoiceDraft,
}

impl Default for App {
    fn default() -> Self {
        Self {
            session: Session::new(),
            view: View::Login,
            inventory: Inventory::new(),
            draft: InvoiceDraft::new(),
        }
    }
}

#[derive(Tabled)]
struct InventoryRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "MEDICINE")]
    name: String,
    #[tabled(rename = "QUANTITY")]
    quantity: u32,
    #[tabled(rename = "PRICE")]
    price: String,
}

#[derive(Tabled)]
struct DraftRow {
    #[tabled(rename = "ROW")]
    index: usize,
    #[tabled(rename = "MEDICINE")]
    name: String,
    #[tabled(rename = "QUANTITY")]
    quantity: String,
    #[tabled(rename = "PRICE")]
    price: String,
    #[tabled(rename = "DISCOUNT (%)")]
    discount: String,
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "MEDICINE")]
    name: String,
    #[tabled(rename = "QUANTITY")]
    quantity: u32,
    #[tabled(rename = "PRICE")]
    price: String,
    #[tabled(rename = "DISCOUNT")]
    discount: String,
    #[tabled(rename = "TOTAL")]
    total: String,
}

pub fn inventory_table(items: &[InventoryItem], currency_label: &str) -> String {
    let rows: Vec<InventoryRow> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| InventoryRow {
            index: idx + 1,
            name: item.name.clone(),
            quantity: item.quantity,
            price: format_money(item.price, currency_label),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn draft_table(rows: &[LineDraft]) -> String {
    let rows: Vec<DraftRow> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| DraftRow {
            index: idx + 1,
            name: row.name.clone(),
            quantity: row.quantity.clone(),
            price: row.price.clone(),
            discount: row.discount.clone(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Computed invoice rows followed by the grand total.
pub fn line_table(lines: &[InvoiceLine], currency_label: &str) -> String {
    let rows: Vec<LineRow> = lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let result = line.result(currency_label);
            LineRow {
                index: idx + 1,
                name: result.display_name,
                quantity: result.quantity,
                price: result.unit_price_text,
                discount: result.discount_text,
                total: format_money(result.line_total, currency_label),
            }
        })
        .collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!(
        "{table}\nGrand Total: {}",
        format_money(grand_total(lines), currency_label)
    )
}

/// Split a command line on whitespace; double quotes group words.
pub fn split_args(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err(HahnemannError::UnterminatedQuote(line.to_string()));
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}

pub struct Shell<W: Write> {
    app: App,
    cfg_dir: PathBuf,
    config: Config,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(cfg_dir: PathBuf, config: Config, out: W) -> Self {
        Self {
            app: App::default(),
            cfg_dir,
            config,
            out,
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Read commands until `quit` or end of input.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<()> {
        writeln!(self.out, "{}", self.config.shop.name)?;
        writeln!(self.out, "Type 'help' for a list of commands.")?;

        let mut lines = input.lines();
        loop {
            write!(self.out, "hahnemann:{}> ", self.app.view.name())?;
            self.out.flush()?;

            let Some(line) = lines.next() else {
                writeln!(self.out)?;
                break;
            };
            // Only reading input or writing to `out` ends the session.
            match self.execute(&line?) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => writeln!(self.out, "Error: {e}")?,
            }
        }
        Ok(())
    }

    /// Run one command line against the session.
    pub fn execute(&mut self, line: &str) -> Result<Flow> {
        let args = split_args(line)?;
        let Some((command, rest)) = args.split_first() else {
            return Ok(Flow::Continue);
        };
        let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
        debug!(command = command.as_str(), view = self.app.view.name(), "shell command");

        match command.as_str() {
            "help" => self.help()?,
            "quit" | "exit" => return Ok(Flow::Quit),
            "login" => self.login(&rest)?,
            "sign-in" => writeln!(self.out, "{}", sign_in_instructions(&self.config.auth))?,
            "token" => self.token(&rest)?,
            other => {
                self.app.session.require_authenticated()?;
                self.authenticated_command(other, &rest)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn authenticated_command(&mut self, command: &str, args: &[&str]) -> Result<()> {
        match command {
            "dashboard" | "home" => self.dashboard(),
            "inventory" => {
                self.app.view = View::Inventory;
                self.show_inventory()
            }
            "add-item" => self.add_item(args),
            "billing" => {
                self.app.view = View::Billing;
                self.show_draft()
            }
            "add-line" => {
                let row = self.app.draft.add_row();
                writeln!(self.out, "Added row {row}.")?;
                Ok(())
            }
            "set" => self.set_field(args),
            "lines" => self.show_lines(),
            "export" => self.export(args),
            "logout" => {
                self.app.session.logout();
                self.app.view = View::Login;
                writeln!(self.out, "Logged out.")?;
                Ok(())
            }
            other => Err(HahnemannError::UnknownCommand(other.to_string())),
        }
    }

    fn help(&mut self) -> Result<()> {
        if self.app.session.is_authenticated() {
            writeln!(
                self.out,
                "Commands:\n  \
                 dashboard                       show the dashboard\n  \
                 inventory                       manage inventory\n  \
                 add-item <name> <qty> <price>   add a medicine to inventory\n  \
                 billing                         create an invoice\n  \
                 add-line                        append a blank invoice row\n  \
                 set <row> <field> <value>       edit name|quantity|price|discount\n  \
                 lines                           preview rows and grand total\n  \
                 export [path] [--no-watermark]  write the PDF invoice\n  \
                 logout                          sign out\n  \
                 quit                            leave the session"
            )?;
        } else {
            writeln!(
                self.out,
                "Commands:\n  \
                 login <username> <password>     sign in\n  \
                 sign-in                         identity-provider instructions\n  \
                 token <credential>              sign in with a provider credential\n  \
                 quit                            leave the session"
            )?;
        }
        Ok(())
    }

    fn login(&mut self, args: &[&str]) -> Result<()> {
        let username = args.first().copied().unwrap_or_default();
        let password = args.get(1).copied().unwrap_or_default();
        self.app.session.login(username, password)?;
        self.app.view = View::Dashboard;
        writeln!(self.out, "Welcome, {username}.")?;
        self.dashboard()
    }

    fn token(&mut self, args: &[&str]) -> Result<()> {
        let token = args.first().copied().unwrap_or_default();
        self.app.session.accept_identity_token(token)?;
        self.app.view = View::Dashboard;
        self.dashboard()
    }

    fn dashboard(&mut self) -> Result<()> {
        self.app.view = View::Dashboard;
        writeln!(self.out, "{} Dashboard", self.config.shop.name)?;
        writeln!(self.out, "  inventory   Manage Inventory")?;
        writeln!(self.out, "  billing     Create Invoice")?;
        Ok(())
    }

    fn show_inventory(&mut self) -> Result<()> {
        if self.app.inventory.is_empty() {
            writeln!(self.out, "Inventory is empty. Add items with: add-item <name> <qty> <price>")?;
            return Ok(());
        }
        let table = inventory_table(self.app.inventory.items(), &self.config.invoice.currency_label);
        writeln!(self.out, "{table}")?;
        Ok(())
    }

    fn add_item(&mut self, args: &[&str]) -> Result<()> {
        if args.len() > 3 {
            return Err(HahnemannError::Usage("add-item <name> <quantity> <price>"));
        }
        let field = |idx: usize| args.get(idx).copied().unwrap_or_default();
        let draft = ItemDraft::new(field(0), field(1), field(2));

        let name = self.app.inventory.add(&draft)?.name.clone();
        self.app.view = View::Inventory;
        writeln!(self.out, "Added {name} to inventory.")?;
        self.show_inventory()
    }

    fn show_draft(&mut self) -> Result<()> {
        let table = draft_table(self.app.draft.rows());
        writeln!(self.out, "{table}")?;
        Ok(())
    }

    fn set_field(&mut self, args: &[&str]) -> Result<()> {
        const USAGE: &str = "set <row> <name|quantity|price|discount> <value>";
        let [row, field, value] = args else {
            return Err(HahnemannError::Usage(USAGE));
        };
        let row: usize = row.parse().map_err(|_| HahnemannError::Usage(USAGE))?;
        let field = Field::parse(field).ok_or(HahnemannError::Usage(USAGE))?;

        self.app.draft.set_field(row, field, value)?;
        self.app.view = View::Billing;
        self.show_draft()
    }

    fn show_lines(&mut self) -> Result<()> {
        let lines = self.app.draft.validate()?;
        let table = line_table(&lines, &self.config.invoice.currency_label);
        writeln!(self.out, "{table}")?;
        Ok(())
    }

    fn export(&mut self, args: &[&str]) -> Result<()> {
        let mut output = None;
        let mut mode = WatermarkMode::Configured;
        for arg in args {
            match *arg {
                "--no-watermark" => mode = WatermarkMode::Skip,
                path if output.is_none() => output = Some(PathBuf::from(path)),
                _ => return Err(HahnemannError::Usage("export [path] [--no-watermark]")),
            }
        }

        let lines = self.app.draft.validate()?;
        let summary = export_invoice(&self.cfg_dir, &self.config, &lines, output, mode)?;
        writeln!(self.out, "Saved {}", summary.path.display())?;
        writeln!(
            self.out,
            "  Grand Total: {}",
            format_money(summary.grand_total, &summary.currency_label)
        )?;
        Ok(())
    }
}
