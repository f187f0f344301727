//! # Interactive Session
//!
//! A line-oriented loop over one [`BillController`]: build a draft, generate,
//! print or export, go back, repeat. Errors are reported and the loop goes on;
//! end of input or `quit` ends the session.

use billgen_core::CoreError;
use billgen_store::KeyValueBackend;
use std::io::{BufRead, Write};

use super::Context;
use crate::cli::parse_item;
use crate::controller::BillController;
use crate::error::{AppError, AppResult};
use crate::receipt::{FileExporter, ReceiptExporter};
use crate::state::ShopField;

const SESSION_HELP: &str = "\
Commands:
  shop <name|location|phone|email> <value>   Set a shop field (empty value clears phone/email)
  add NAME:PRICE:GST:QTY                     Add a product
  update <#|id> NAME:PRICE:GST:QTY           Replace a product
  remove <#|id>                              Remove a product
  list                                       Show the draft with live totals
  generate                                   Validate, save and show the bill
  print                                      Show the generated bill again
  export                                     Write the generated bill's receipt file
  back                                       Start a new bill for the same shop
  help                                       Show this list
  quit                                       Leave the session
";

enum Flow {
    Continue,
    Quit,
}

/// Runs the session until `quit` or end of input.
pub async fn run<B, R, W>(ctx: &Context<B>, input: R, out: &mut W) -> AppResult<()>
where
    B: KeyValueBackend,
    R: BufRead,
    W: Write,
{
    let mut controller = BillController::with_shop(ctx.history.clone(), ctx.config.default_shop());
    let exporter = ctx.exporter(None, None);

    writeln!(out, "Bill Generator. Type 'help' for commands.")?;
    prompt(out, &controller)?;

    for line in input.lines() {
        let line = line?;
        match step(ctx, &mut controller, &exporter, line.trim(), out).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => writeln!(out, "error: {}", e)?,
        }
        prompt(out, &controller)?;
    }

    writeln!(out)?;
    Ok(())
}

fn prompt<B: KeyValueBackend, W: Write>(out: &mut W, controller: &BillController<B>) -> AppResult<()> {
    let mode = if controller.is_finalized() { "bill" } else { "draft" };
    write!(out, "{}> ", mode)?;
    out.flush()?;
    Ok(())
}

async fn step<B, W>(
    ctx: &Context<B>,
    controller: &mut BillController<B>,
    exporter: &FileExporter,
    line: &str,
    out: &mut W,
) -> AppResult<Flow>
where
    B: KeyValueBackend,
    W: Write,
{
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match command.to_lowercase().as_str() {
        "" => {}
        "help" => write!(out, "{}", SESSION_HELP)?,
        "quit" | "exit" => return Ok(Flow::Quit),

        "shop" => {
            let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if field.is_empty() {
                return Err(AppError::usage("shop needs a field: name, location, phone or email"));
            }
            let field = field.parse::<ShopField>().map_err(AppError::usage)?;
            let view = controller.set_shop_field(field, value.trim())?;
            write!(out, "{}", ctx.renderer.draft(&view))?;
        }
        "add" => {
            let input = parse_item(rest)?;
            let view = controller.add_product(input)?;
            write!(out, "{}", ctx.renderer.draft(&view))?;
        }
        "update" => {
            let (reference, item) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| AppError::usage("usage: update <#|id> NAME:PRICE:GST:QTY"))?;
            let id = resolve(controller, reference)?;
            let input = parse_item(item.trim())?;
            let view = controller.update_product(&id, input)?;
            write!(out, "{}", ctx.renderer.draft(&view))?;
        }
        "remove" => {
            if rest.is_empty() {
                return Err(AppError::usage("usage: remove <#|id>"));
            }
            let id = resolve(controller, rest)?;
            let view = controller.remove_product(&id)?;
            write!(out, "{}", ctx.renderer.draft(&view))?;
        }
        "list" => write!(out, "{}", ctx.renderer.draft(&controller.preview()))?,

        "generate" => {
            let bill = controller.generate_bill().await?;
            write!(out, "{}", ctx.renderer.text(&bill))?;
            writeln!(out, "Saved {} (id {})", bill.bill_number, bill.id)?;
        }
        "print" => {
            let bill = finalized(controller, "print")?;
            write!(out, "{}", ctx.renderer.text(bill))?;
        }
        "export" => {
            let bill = finalized(controller, "export")?;
            let path = exporter.export(bill).await?;
            writeln!(out, "Receipt written to {}", path.display())?;
        }
        "back" => {
            let view = controller.back_to_generator();
            write!(out, "{}", ctx.renderer.draft(&view))?;
        }

        other => {
            return Err(AppError::usage(format!(
                "Unknown command '{}'. Type 'help' for commands.",
                other
            )))
        }
    }

    Ok(Flow::Continue)
}

fn resolve<B: KeyValueBackend>(controller: &BillController<B>, reference: &str) -> AppResult<String> {
    controller
        .resolve_product(reference)
        .ok_or_else(|| CoreError::ProductNotFound(reference.to_string()).into())
}

fn finalized<'a, B: KeyValueBackend>(
    controller: &'a BillController<B>,
    operation: &str,
) -> AppResult<&'a billgen_core::Bill> {
    controller.current_bill().ok_or_else(|| {
        CoreError::InvalidState {
            operation: operation.to_string(),
            state: "drafting".to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use billgen_store::{HistoryStore, MemoryBackend};
    use std::io::Cursor;
    use std::sync::Arc;

    fn context(config: AppConfig) -> Context<MemoryBackend> {
        Context::new(config, Arc::new(HistoryStore::new(MemoryBackend::new())))
    }

    async fn session(ctx: &Context<MemoryBackend>, script: &str) -> String {
        let mut out = Vec::new();
        run(ctx, Cursor::new(script.to_string()), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_full_bill_flow() {
        let ctx = context(AppConfig::default());
        let script = "\
shop name Shop A
shop location City
add Pen:10:5:2
add Notebook:50:12:1
generate
quit
";
        let text = session(&ctx, script).await;

        assert!(text.contains("Total Amount:"));
        assert!(text.contains("Saved BILL-"));

        let bills = ctx.history.list().await;
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].item_count(), 2);
        assert_eq!(bills[0].total_amount.value(), 77.0);
    }

    #[tokio::test]
    async fn test_errors_do_not_end_session() {
        let ctx = context(AppConfig::default());
        let script = "\
generate
add Pen:10:150:1
frobnicate
shop fax 123
print
list
";
        let text = session(&ctx, script).await;

        assert_eq!(text.matches("error:").count(), 5);
        assert!(text.contains("No products added yet"));
        assert!(ctx.history.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_remove_by_line_number() {
        let ctx = context(AppConfig::default());
        let script = "\
add Pen:10:5:2
add Ruler:5:0:1
update 1 Marker:25:12:1
remove 2
remove 7
list
";
        let text = session(&ctx, script).await;

        assert!(text.contains("Marker"));
        assert!(text.contains("Product not found: 7"));
        assert!(text.trim_end().ends_with("draft>"));
        assert!(text.contains("Total ₹28.00"));
    }

    #[tokio::test]
    async fn test_finalized_blocks_edits_until_back() {
        let mut config = AppConfig::default();
        config.shop.name = Some("Shop A".to_string());
        config.shop.location = Some("City".to_string());
        let ctx = context(config);

        let script = "\
add Pen:10:5:2
generate
add Ruler:5:0:1
back
add Ruler:5:0:1
generate
";
        let text = session(&ctx, script).await;

        assert!(text.contains("Cannot add a product while a bill is finalized"));
        let bills = ctx.history.list().await;
        assert_eq!(bills.len(), 2);
        assert_eq!(bills[0].products[0].name, "Ruler");
        assert_eq!(bills[1].products[0].name, "Pen");
    }

    #[tokio::test]
    async fn test_export_after_generate() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.shop.name = Some("Shop A".to_string());
        config.shop.location = Some("City".to_string());
        config.export.directory = dir.path().to_path_buf();
        let ctx = context(config);

        let text = session(&ctx, "add Pen:10:5:2\ngenerate\nexport\n").await;

        assert!(text.contains("Receipt written to"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_end_of_input_ends_session() {
        let ctx = context(AppConfig::default());
        let text = session(&ctx, "").await;
        assert!(text.starts_with("Bill Generator."));
    }
}
