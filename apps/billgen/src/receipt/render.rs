//! # Receipt Rendering
//!
//! ## Text Layout
//! ```text
//! ================================================================
//!                              Shop A
//!                               City
//! ================================================================
//! Bill No: BILL-20240115-143052
//! Date:    15/01/2024 14:30
//! ----------------------------------------------------------------
//! Item                    Price  GST%   Qty    GST Amt      Total
//! Pen                     10.00     5     2       1.00      21.00
//! ----------------------------------------------------------------
//! Subtotal:                                                 ₹20.00
//! Total GST:                                                 ₹1.00
//! Total Amount:                                             ₹21.00
//! ================================================================
//! ```
//!
//! Every amount goes through `Amount`'s `Display`, so two-decimal rounding
//! happens here and nowhere else.

use billgen_core::money::Amount;
use billgen_core::{Bill, ShopDetails};
use chrono::{DateTime, FixedOffset, Local, Offset};
use std::fmt::Write as _;

use super::ExportFormat;
use crate::state::DraftView;

const WIDTH: usize = 64;
const ITEM_WIDTH: usize = 20;

/// Renders bills for people.
///
/// Dates print in a fixed UTC offset, captured from the local clock by
/// [`ReceiptRenderer::new`].
#[derive(Debug, Clone)]
pub struct ReceiptRenderer {
    currency_symbol: String,
    offset: FixedOffset,
}

impl ReceiptRenderer {
    /// Creates a renderer using the machine's current UTC offset.
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        ReceiptRenderer {
            currency_symbol: currency_symbol.into(),
            offset: Local::now().offset().fix(),
        }
    }

    /// Overrides the UTC offset dates are shown in.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Returns the currency symbol.
    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    /// Formats an amount with the currency symbol, e.g. `₹21.00`.
    pub fn format_amount(&self, amount: Amount) -> String {
        format!("{}{}", self.currency_symbol, amount)
    }

    fn local(&self, bill: &Bill) -> DateTime<FixedOffset> {
        bill.date.with_timezone(&self.offset)
    }

    /// Renders in the given export format.
    pub fn render(&self, bill: &Bill, format: ExportFormat) -> String {
        match format {
            ExportFormat::Html => self.html(bill),
            ExportFormat::Text => self.text(bill),
        }
    }

    // =========================================================================
    // Text
    // =========================================================================

    /// Plain-text receipt for the terminal or a line printer.
    pub fn text(&self, bill: &Bill) -> String {
        let mut out = String::new();
        let heavy = "=".repeat(WIDTH);
        let light = "-".repeat(WIDTH);

        let _ = writeln!(out, "{heavy}");
        for line in shop_header_lines(&bill.shop_details) {
            let _ = writeln!(out, "{:^WIDTH$}", line);
        }
        let _ = writeln!(out, "{heavy}");
        let _ = writeln!(out, "Bill No: {}", bill.bill_number);
        let _ = writeln!(out, "Date:    {}", self.local(bill).format("%d/%m/%Y %H:%M"));
        let _ = writeln!(out, "{light}");
        let _ = writeln!(
            out,
            "{:<ITEM_WIDTH$} {:>8} {:>5} {:>5} {:>10} {:>10}",
            "Item", "Price", "GST%", "Qty", "GST Amt", "Total"
        );

        for (product, amounts) in bill.lines() {
            let _ = writeln!(
                out,
                "{:<ITEM_WIDTH$} {:>8} {:>5} {:>5} {:>10} {:>10}",
                truncate(&product.name, ITEM_WIDTH),
                product.price.to_string(),
                product.gst.percent(),
                product.quantity,
                amounts.gst.to_string(),
                amounts.total.to_string(),
            );
        }

        let _ = writeln!(out, "{light}");
        self.write_total(&mut out, "Subtotal:", bill.subtotal);
        self.write_total(&mut out, "Total GST:", bill.total_gst);
        self.write_total(&mut out, "Total Amount:", bill.total_amount);
        let _ = writeln!(out, "{heavy}");
        let _ = writeln!(out, "{:^WIDTH$}", "Thank you for your business!");
        out
    }

    fn write_total(&self, out: &mut String, label: &str, amount: Amount) {
        let value = self.format_amount(amount);
        let pad = WIDTH.saturating_sub(label.chars().count() + value.chars().count());
        let _ = writeln!(out, "{}{}{}", label, " ".repeat(pad), value);
    }

    // =========================================================================
    // HTML
    // =========================================================================

    /// Standalone printable HTML receipt.
    pub fn html(&self, bill: &Bill) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Receipt {number}</title>
    <style>
      body {{ font-family: Arial, sans-serif; margin: 0; padding: 20px; }}
      .receipt {{ max-width: 600px; margin: 0 auto; }}
      table {{ width: 100%; border-collapse: collapse; margin: 20px 0; }}
      th, td {{ padding: 8px; text-align: left; border-bottom: 1px solid #ddd; }}
      th {{ background-color: #f5f5f5; }}
      .text-center {{ text-align: center; }}
      .text-right {{ text-align: right; }}
      .font-bold {{ font-weight: bold; }}
      .text-xl {{ font-size: 1.25rem; }}
      .mb-4 {{ margin-bottom: 1rem; }}
      .border-t {{ border-top: 2px solid #000; }}
      .pt-4 {{ padding-top: 1rem; }}
    </style>
  </head>
  <body>
    <div class="receipt" id="receipt-content">
      <div class="text-center mb-4">
"#,
            number = escape_html(&bill.bill_number),
        );

        let mut header = shop_header_lines(&bill.shop_details).into_iter();
        if let Some(name) = header.next() {
            let _ = writeln!(out, "        <h1 class=\"text-xl font-bold\">{}</h1>", escape_html(&name));
        }
        for line in header {
            let _ = writeln!(out, "        <p>{}</p>", escape_html(&line));
        }

        let _ = write!(
            out,
            r#"      </div>
      <p><span class="font-bold">Bill No:</span> {number}</p>
      <p><span class="font-bold">Date:</span> {date}</p>
      <table>
        <thead>
          <tr><th>Item</th><th>Price</th><th>GST%</th><th>Qty</th><th>GST Amt</th><th>Total</th></tr>
        </thead>
        <tbody>
"#,
            number = escape_html(&bill.bill_number),
            date = self.local(bill).format("%d/%m/%Y %H:%M"),
        );

        for (product, amounts) in bill.lines() {
            let _ = writeln!(
                out,
                "          <tr><td>{}</td><td>{}</td><td>{}%</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&product.name),
                escape_html(&self.format_amount(product.price)),
                product.gst.percent(),
                product.quantity,
                escape_html(&self.format_amount(amounts.gst)),
                escape_html(&self.format_amount(amounts.total)),
            );
        }

        let _ = write!(
            out,
            r#"        </tbody>
      </table>
      <div class="border-t pt-4">
        <p>Subtotal: <span class="text-right">{subtotal}</span></p>
        <p>Total GST: <span class="text-right">{gst}</span></p>
        <p class="text-xl font-bold">Total Amount: <span class="text-right">{total}</span></p>
      </div>
      <p class="text-center">Thank you for your business!</p>
    </div>
  </body>
</html>
"#,
            subtotal = escape_html(&self.format_amount(bill.subtotal)),
            gst = escape_html(&self.format_amount(bill.total_gst)),
            total = escape_html(&self.format_amount(bill.total_amount)),
        );
        out
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// One history entry: number, shop, date, item count, total.
    pub fn history_line(&self, bill: &Bill) -> String {
        let items = bill.item_count();
        format!(
            "{}  {} ({})  {}  {} {}  {}  [{}]",
            bill.bill_number,
            bill.shop_details.name,
            bill.shop_details.location,
            self.local(bill).format("%d/%m/%Y %H:%M"),
            items,
            if items == 1 { "item" } else { "items" },
            self.format_amount(bill.total_amount),
            bill.id,
        )
    }

    /// The working draft: numbered lines with live totals.
    pub fn draft(&self, view: &DraftView) -> String {
        let mut out = String::new();
        let shop = &view.shop;
        let _ = writeln!(
            out,
            "Shop: {} / {}",
            or_dash(&shop.name),
            or_dash(&shop.location)
        );

        if view.lines.is_empty() {
            let _ = writeln!(out, "No products added yet");
        } else {
            let _ = writeln!(
                out,
                "{:>3}  {:<ITEM_WIDTH$} {:>8} {:>5} {:>5} {:>10} {:>10}",
                "#", "Item", "Price", "GST%", "Qty", "GST Amt", "Total"
            );
            for (index, line) in view.lines.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{:>3}  {:<ITEM_WIDTH$} {:>8} {:>5} {:>5} {:>10} {:>10}",
                    index + 1,
                    truncate(&line.product.name, ITEM_WIDTH),
                    line.product.price.to_string(),
                    line.product.gst.percent(),
                    line.product.quantity,
                    line.amounts.gst.to_string(),
                    line.amounts.total.to_string(),
                );
            }
        }

        let _ = writeln!(
            out,
            "Subtotal {}  GST {}  Total {}",
            self.format_amount(view.totals.subtotal),
            self.format_amount(view.totals.total_gst),
            self.format_amount(view.totals.total_amount),
        );
        out
    }
}

fn shop_header_lines(shop: &ShopDetails) -> Vec<String> {
    let mut lines = vec![shop.name.clone(), shop.location.clone()];
    if let Some(phone) = shop.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        lines.push(format!("Phone: {}", phone));
    }
    if let Some(email) = shop.email.as_deref().filter(|e| !e.trim().is_empty()) {
        lines.push(format!("Email: {}", email));
    }
    lines
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max - 1).collect();
        cut.push('…');
        cut
    }
}

fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        "-"
    } else {
        text
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use billgen_core::identity::BillIdentity;
    use billgen_core::ProductInput;
    use chrono::{TimeZone, Utc};

    fn sample_bill() -> Bill {
        let identity = BillIdentity {
            id: "bill-1".to_string(),
            bill_number: "BILL-20240115-143052".to_string(),
            date: Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 52).unwrap(),
        };
        let products = vec![
            ProductInput::new("Pen", 10.0, 5.0, 2).into_product("p-1"),
            ProductInput::new("Notebook <A5>", 45.5, 12.0, 1).into_product("p-2"),
        ];
        let shop = ShopDetails::new("Shop A", "City").with_phone("98765 43210");
        Bill::assemble(identity, shop, products)
    }

    fn renderer() -> ReceiptRenderer {
        ReceiptRenderer::new("₹").with_offset(FixedOffset::east_opt(0).unwrap())
    }

    #[test]
    fn test_text_receipt() {
        let text = renderer().text(&sample_bill());

        assert!(text.contains("Shop A"));
        assert!(text.contains("Phone: 98765 43210"));
        assert!(!text.contains("Email:"));
        assert!(text.contains("Bill No: BILL-20240115-143052"));
        assert!(text.contains("Date:    15/01/2024 14:30"));
        assert!(text.contains("Item"));
        assert!(text.contains("GST Amt"));
        assert!(text.contains("₹65.50"));
        assert!(text.contains("₹6.46"));
        assert!(text.contains("₹71.96"));
    }

    #[test]
    fn test_text_total_lines_align() {
        let text = renderer().text(&sample_bill());
        let total_line = text.lines().find(|l| l.starts_with("Total Amount:")).unwrap();
        assert_eq!(total_line.chars().count(), WIDTH);
    }

    #[test]
    fn test_html_receipt_escapes_and_styles() {
        let html = renderer().html(&sample_bill());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("max-width: 600px"));
        assert!(html.contains("border-collapse: collapse"));
        assert!(html.contains("Notebook &lt;A5&gt;"));
        assert!(!html.contains("<A5>"));
        assert!(html.contains("<h1 class=\"text-xl font-bold\">Shop A</h1>"));
        assert!(html.contains("₹71.96"));
    }

    #[test]
    fn test_dates_follow_offset() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let text = ReceiptRenderer::new("₹").with_offset(ist).text(&sample_bill());
        assert!(text.contains("15/01/2024 20:00"));
    }

    #[test]
    fn test_history_line() {
        let line = renderer().history_line(&sample_bill());
        assert_eq!(
            line,
            "BILL-20240115-143052  Shop A (City)  15/01/2024 14:30  2 items  ₹71.96  [bill-1]"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Pen", 5), "Pen");
        assert_eq!(truncate("Ballpoint", 5), "Ball…");
    }
}
