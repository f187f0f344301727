//! # Bill Commands
//!
//! One-shot bill generation from the command line.

use billgen_core::{Bill, ShopDetails};
use billgen_store::KeyValueBackend;
use std::io::Write;
use tracing::debug;

use super::Context;
use crate::cli::GenerateArgs;
use crate::controller::BillController;
use crate::error::AppResult;
use crate::receipt::ReceiptExporter;

/// Generates, saves and optionally prints and exports one bill.
///
/// ## Flow
/// ```text
/// args ──► draft (shop + items) ──► generate_bill ──► history
///                                         │
///                                         ├──► --print  : text receipt to `out`
///                                         └──► --export : receipt file
/// ```
///
/// An export failure is reported after the bill is already saved; history
/// is not rolled back.
pub async fn generate<B, W>(ctx: &Context<B>, args: GenerateArgs, out: &mut W) -> AppResult<Bill>
where
    B: KeyValueBackend,
    W: Write,
{
    let mut controller = BillController::new(ctx.history.clone());
    controller.set_shop_details(merge_shop(args.shop, ctx.config.default_shop()))?;

    for item in args.items {
        controller.add_product(item)?;
    }
    debug!(items = controller.preview().lines.len(), "Draft assembled from arguments");

    let bill = controller.generate_bill().await?;
    writeln!(
        out,
        "Generated {} for {}  total {}  id {}",
        bill.bill_number,
        bill.shop_details.name,
        ctx.renderer.format_amount(bill.total_amount),
        bill.id
    )?;

    if args.print {
        write!(out, "{}", ctx.renderer.text(&bill))?;
    }

    if args.export {
        let path = ctx.exporter(None, None).export(&bill).await?;
        writeln!(out, "Receipt written to {}", path.display())?;
    }

    Ok(bill)
}

/// Fields given on the command line win; blank ones fall back to defaults.
fn merge_shop(given: ShopDetails, defaults: ShopDetails) -> ShopDetails {
    fn pick(given: String, default: String) -> String {
        if given.trim().is_empty() {
            default
        } else {
            given
        }
    }

    ShopDetails {
        name: pick(given.name, defaults.name),
        location: pick(given.location, defaults.location),
        phone: given.phone.or(defaults.phone),
        email: given.email.or(defaults.email),
    }
}
