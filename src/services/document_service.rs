// src/services/document_service.rs

use chrono::{DateTime, Utc};
use genpdf::{elements, fonts, style, Alignment, Element};
use image::DynamicImage;
use rust_decimal::Decimal;

use crate::{
    barcode::{render, Symbology},
    common::{error::AppError, money::round_money},
    models::{
        audit::AuditEntry,
        orders::{OrderCounts, OrderDetail, PurchaseOrder},
        pricing::ClientPriceView,
        product::{InventoryStats, Product, StockLevel},
        purchase::Purchase,
        sales::{Client, SaleDetail, SaleStatus},
        supplier::{Supplier, SupplierCounts, SupplierStatus},
    },
};

pub const LABEL_NAME_CHARS: usize = 40;
pub const AUDIT_DESCRIPTION_CHARS: usize = 30;
pub const AUDIT_EXPORT_ROWS: usize = 500;

// ---
// Formatação
// ---

/// `$1,234.50` (sempre com duas casas)
pub fn format_money(value: Decimal) -> String {
    let rounded = round_money(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}${}.{}", sign, grouped, frac_part)
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

fn stock_level_label(level: StockLevel) -> &'static str {
    match level {
        StockLevel::Sufficient => "Suficiente",
        StockLevel::Low => "Bajo",
        StockLevel::Critical => "Crítico",
    }
}

// ---
// Modelo do documento (independente do genpdf)
// ---

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub weights: Vec<usize>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn new(columns: &[(&str, usize)]) -> Self {
        Self {
            headers: columns.iter().map(|(h, _)| h.to_string()).collect(),
            weights: columns.iter().map(|(_, w)| *w).collect(),
            rows: Vec::new(),
        }
    }

    /// Completa ou corta a linha para o número de colunas.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub title: String,
    pub subtitle: Option<String>,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
    pub landscape: bool,
    pub header: Vec<(String, String)>,
    pub summary: Vec<(String, String)>,
    pub table: ReportTable,
    pub totals: Vec<(String, String)>,
    pub notes: Option<String>,
}

impl ReportDocument {
    fn new(title: &str, table: ReportTable, generated_by: &str, generated_at: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            subtitle: None,
            generated_by: generated_by.to_string(),
            generated_at,
            landscape: false,
            header: Vec::new(),
            summary: Vec::new(),
            table,
            totals: Vec::new(),
            notes: None,
        }
    }

    fn pair(list: &mut Vec<(String, String)>, label: &str, value: impl ToString) {
        list.push((label.to_string(), value.to_string()));
    }
}

fn totals_block(subtotal: Decimal, iva_percent: Decimal, iva: Decimal, discount: Option<Decimal>, total: Decimal) -> Vec<(String, String)> {
    let mut lines = vec![
        ("Subtotal".to_string(), format_money(subtotal)),
        (format!("IVA ({}%)", iva_percent.normalize()), format_money(iva)),
    ];
    if let Some(discount) = discount {
        lines.push(("Descuento".to_string(), format_money(discount)));
    }
    lines.push(("TOTAL".to_string(), format_money(total)));
    lines
}

// ---
// Construtores de cada documento
// ---

pub fn inventory_report(products: &[Product], stats: &InventoryStats, by: &str, at: DateTime<Utc>) -> ReportDocument {
    let mut table = ReportTable::new(&[
        ("Código", 2),
        ("Nombre", 4),
        ("Categoría", 2),
        ("Cant.", 1),
        ("Mín.", 1),
        ("Precio", 2),
        ("Nivel", 2),
    ]);
    let mut inventory_value = Decimal::ZERO;
    for p in products {
        inventory_value += Decimal::from(p.quantity) * p.unit_cost;
        table.push_row(vec![
            p.code.clone(),
            p.name.clone(),
            or_dash(p.category.as_deref()),
            p.quantity.to_string(),
            p.min_stock.to_string(),
            format_money(p.price),
            stock_level_label(StockLevel::from_quantity(p.quantity)).to_string(),
        ]);
    }

    let mut doc = ReportDocument::new("REPORTE DE INVENTARIO", table, by, at);
    ReportDocument::pair(&mut doc.summary, "Total productos", stats.total_products);
    ReportDocument::pair(&mut doc.summary, "Stock bajo", stats.low_stock);
    ReportDocument::pair(&mut doc.summary, "Stock crítico", stats.critical_stock);
    ReportDocument::pair(&mut doc.summary, "Categorías", stats.categories);
    ReportDocument::pair(&mut doc.summary, "Valor del inventario", format_money(inventory_value));
    doc
}

pub fn sale_invoice(detail: &SaleDetail, by: &str, at: DateTime<Utc>) -> ReportDocument {
    let sale = &detail.summary.sale;
    let mut table = ReportTable::new(&[("Producto", 5), ("Cant.", 1), ("Precio unit.", 2), ("Subtotal", 2)]);
    for line in &detail.lines {
        table.push_row(vec![
            line.description.clone(),
            line.quantity.to_string(),
            format_money(line.unit_price),
            format_money(line.subtotal),
        ]);
    }

    let mut doc = ReportDocument::new("FACTURA DE VENTA", table, by, at);
    doc.subtitle = Some(sale.number.clone());
    ReportDocument::pair(&mut doc.header, "Fecha", sale.created_at.format("%d/%m/%Y %H:%M"));
    ReportDocument::pair(&mut doc.header, "Cliente", or_dash(detail.summary.client_name.as_deref()));
    ReportDocument::pair(&mut doc.header, "Documento", or_dash(detail.summary.client_document.as_deref()));
    ReportDocument::pair(&mut doc.header, "Vendedor", or_dash(detail.summary.seller_name.as_deref()));
    if sale.status == SaleStatus::Annulled {
        ReportDocument::pair(&mut doc.header, "Estado", "ANULADA");
    }
    doc.totals = totals_block(sale.subtotal, sale.iva_percent, sale.iva, Some(sale.discount), sale.total);
    doc.notes = sale.notes.clone();
    doc
}

pub fn purchase_voucher(purchase: &Purchase, by: &str, at: DateTime<Utc>) -> ReportDocument {
    let mut table = ReportTable::new(&[("Producto", 5), ("Cant.", 1), ("Precio unit.", 2), ("Subtotal", 2)]);
    table.push_row(vec![
        purchase.product.clone(),
        purchase.quantity.to_string(),
        format_money(purchase.unit_price),
        format_money(purchase.subtotal),
    ]);

    let mut doc = ReportDocument::new("COMPROBANTE DE COMPRA", table, by, at);
    doc.subtitle = Some(purchase.invoice_number.clone());
    ReportDocument::pair(&mut doc.header, "Proveedor", &purchase.supplier);
    ReportDocument::pair(&mut doc.header, "Tipo", purchase.kind.label());
    ReportDocument::pair(&mut doc.header, "Fecha de compra", purchase.purchase_date.format("%d/%m/%Y"));
    doc.totals = totals_block(purchase.subtotal, purchase.iva_percent, purchase.iva, None, purchase.total);
    doc.notes = purchase.notes.clone();
    doc
}

pub fn order_document(detail: &OrderDetail, by: &str, at: DateTime<Utc>) -> ReportDocument {
    let order = &detail.order;
    let mut table = ReportTable::new(&[
        ("Ítem", 1),
        ("Descripción", 6),
        ("Cant.", 1),
        ("Und.", 1),
        ("Precio unit.", 2),
        ("Subtotal", 2),
    ]);
    for line in &detail.lines {
        table.push_row(vec![
            line.position.to_string(),
            line.description.clone(),
            line.quantity.normalize().to_string(),
            line.unit.clone(),
            format_money(line.unit_price),
            format_money(line.subtotal),
        ]);
    }

    let mut doc = ReportDocument::new(order.kind.title(), table, by, at);
    doc.subtitle = Some(order.number.clone());
    ReportDocument::pair(&mut doc.header, "Fecha", order.issue_date.format("%d/%m/%Y"));
    ReportDocument::pair(&mut doc.header, "Proveedor", &order.supplier_name);
    ReportDocument::pair(&mut doc.header, "Dirección", or_dash(order.supplier_address.as_deref()));
    ReportDocument::pair(&mut doc.header, "Teléfono", or_dash(order.supplier_phone.as_deref()));
    if let Some(number) = &order.client_order_number {
        ReportDocument::pair(&mut doc.header, "Orden del cliente", number);
    }
    if let Some(branch) = &order.client_branch {
        ReportDocument::pair(&mut doc.header, "Sucursal", branch);
    }
    ReportDocument::pair(&mut doc.header, "Estado", order.status.label());
    ReportDocument::pair(&mut doc.header, "Elaboró", or_dash(detail.prepared_by_name.as_deref()));
    ReportDocument::pair(&mut doc.header, "Verificó", or_dash(detail.verified_by_name.as_deref()));
    doc.totals = totals_block(order.subtotal, order.iva_percent, order.iva, Some(order.discount), order.total);
    doc.notes = order.notes.clone();
    doc
}

pub fn orders_report(orders: &[PurchaseOrder], counts: &OrderCounts, by: &str, at: DateTime<Utc>) -> ReportDocument {
    let mut table = ReportTable::new(&[
        ("Número", 2),
        ("Tipo", 1),
        ("Fecha", 2),
        ("Proveedor", 5),
        ("Orden cliente", 2),
        ("Estado", 2),
        ("Total", 2),
    ]);
    for o in orders {
        table.push_row(vec![
            o.number.clone(),
            o.kind.prefix().to_string(),
            o.issue_date.format("%d/%m/%Y").to_string(),
            o.supplier_name.clone(),
            or_dash(o.client_order_number.as_deref()),
            o.status.label().to_string(),
            format_money(o.total),
        ]);
    }

    let mut doc = ReportDocument::new("REPORTE DE ÓRDENES", table, by, at);
    doc.landscape = true;
    ReportDocument::pair(&mut doc.summary, "Total", counts.total);
    ReportDocument::pair(&mut doc.summary, "Pendientes", counts.pending);
    ReportDocument::pair(&mut doc.summary, "Completadas", counts.completed);
    ReportDocument::pair(&mut doc.summary, "Canceladas", counts.cancelled);
    ReportDocument::pair(&mut doc.summary, "Monto total", format_money(counts.amount));
    doc
}

pub fn suppliers_report(suppliers: &[Supplier], counts: &SupplierCounts, by: &str, at: DateTime<Utc>) -> ReportDocument {
    let mut table = ReportTable::new(&[
        ("Nombre", 4),
        ("NIT", 2),
        ("Tipo", 2),
        ("Teléfono", 2),
        ("Email", 3),
        ("Contacto", 3),
        ("Estado", 1),
    ]);
    for s in suppliers {
        table.push_row(vec![
            s.name.clone(),
            or_dash(s.nit.as_deref()),
            s.kind.label().to_string(),
            or_dash(s.phone.as_deref()),
            or_dash(s.email.as_deref()),
            or_dash(s.contact_name.as_deref()),
            match s.status {
                SupplierStatus::Active => "Activo",
                SupplierStatus::Inactive => "Inactivo",
            }
            .to_string(),
        ]);
    }

    let mut doc = ReportDocument::new("REPORTE DE PROVEEDORES", table, by, at);
    doc.landscape = true;
    ReportDocument::pair(&mut doc.summary, "Total", counts.total);
    ReportDocument::pair(&mut doc.summary, "Activos", counts.active);
    ReportDocument::pair(&mut doc.summary, "Inactivos", counts.inactive);
    ReportDocument::pair(&mut doc.summary, "Nacionales", counts.national);
    doc
}

pub fn client_price_list(client: &Client, prices: &[ClientPriceView], by: &str, at: DateTime<Utc>) -> ReportDocument {
    let mut table = ReportTable::new(&[
        ("Código", 2),
        ("Producto", 4),
        ("Precio base", 2),
        ("IVA %", 1),
        ("Con IVA", 2),
        ("Desc. %", 1),
        ("Precio final", 2),
    ]);
    for p in prices {
        table.push_row(vec![
            p.product_code.clone(),
            p.product_name.clone(),
            format_money(p.price.base_price),
            p.price.iva_percent.normalize().to_string(),
            format_money(p.price.price_with_iva),
            p.price.discount_percent.normalize().to_string(),
            format_money(p.price.final_price),
        ]);
    }

    let mut doc = ReportDocument::new("LISTA DE PRECIOS", table, by, at);
    ReportDocument::pair(&mut doc.header, "Cliente", &client.name);
    ReportDocument::pair(&mut doc.header, "Documento", &client.document);
    ReportDocument::pair(&mut doc.summary, "Productos", prices.len());
    doc
}

pub fn audit_report(entries: &[AuditEntry], by: &str, at: DateTime<Utc>) -> ReportDocument {
    let mut table = ReportTable::new(&[
        ("Fecha", 3),
        ("Usuario", 2),
        ("Acción", 2),
        ("Módulo", 2),
        ("Descripción", 5),
        ("IP", 2),
    ]);
    for e in entries.iter().take(AUDIT_EXPORT_ROWS) {
        table.push_row(vec![
            e.created_at.format("%d/%m/%Y %H:%M").to_string(),
            e.username.clone(),
            format!("{:?}", e.action).to_uppercase(),
            format!("{:?}", e.module).to_uppercase(),
            truncate(e.description.as_deref().unwrap_or("-"), AUDIT_DESCRIPTION_CHARS),
            or_dash(e.ip_address.as_deref()),
        ]);
    }

    let mut doc = ReportDocument::new("BITÁCORA DEL SISTEMA", table, by, at);
    doc.landscape = true;
    ReportDocument::pair(&mut doc.summary, "Registros", doc.table.rows.len());
    doc
}

// ---
// Renderização (genpdf)
// ---

#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: String,
    font_family: String,
    company_name: String,
}

impl DocumentService {
    pub fn new(fonts_dir: String, font_family: String, company_name: String) -> Self {
        Self { fonts_dir, font_family, company_name }
    }

    fn load_fonts(&self) -> Result<fonts::FontFamily<fonts::FontData>, AppError> {
        fonts::from_files(&self.fonts_dir, &self.font_family, None).map_err(|e| {
            tracing::error!("🔥 Fonte {} não encontrada em {}: {}", self.font_family, self.fonts_dir, e);
            AppError::FontNotFound(format!("{}/{}", self.fonts_dir, self.font_family))
        })
    }

    pub fn render(&self, report: &ReportDocument) -> Result<Vec<u8>, AppError> {
        let mut doc = genpdf::Document::new(self.load_fonts()?);
        doc.set_title(report.title.clone());
        if report.landscape {
            doc.set_paper_size(genpdf::Size::new(297, 210));
        }
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(
            elements::Paragraph::new(self.company_name.clone())
                .styled(style::Style::new().bold().with_font_size(18)),
        );
        doc.push(
            elements::Paragraph::new(report.title.clone())
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        if let Some(subtitle) = &report.subtitle {
            doc.push(elements::Paragraph::new(format!("No. {}", subtitle)).styled(style::Style::new().bold()));
        }
        doc.push(
            elements::Paragraph::new(format!(
                "Generado el {} por {}",
                report.generated_at.format("%d/%m/%Y %H:%M"),
                report.generated_by
            ))
            .styled(style::Style::new().italic().with_font_size(8)),
        );
        doc.push(elements::Break::new(1));

        for (label, value) in &report.header {
            doc.push(elements::Paragraph::new(format!("{}: {}", label, value)));
        }

        // --- RESUMO ---
        if !report.summary.is_empty() {
            doc.push(elements::Break::new(1));
            let mut summary = elements::TableLayout::new(vec![1; report.summary.len()]);
            summary.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
            let mut labels = summary.row();
            for (label, _) in &report.summary {
                labels.push_element(
                    elements::Paragraph::new(label.clone())
                        .styled(style::Style::new().bold().with_font_size(8)),
                );
            }
            labels.push()?;
            let mut values = summary.row();
            for (_, value) in &report.summary {
                values.push_element(elements::Paragraph::new(value.clone()));
            }
            values.push()?;
            doc.push(summary);
        }

        doc.push(elements::Break::new(1.5));

        // --- TABELA ---
        if report.table.rows.is_empty() {
            doc.push(elements::Paragraph::new("Sin registros.").styled(style::Style::new().italic()));
        } else {
            let font_size = if report.landscape { 8 } else { 9 };
            let mut table = elements::TableLayout::new(report.table.weights.clone());
            table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

            let style_bold = style::Style::new().bold().with_font_size(font_size);
            let mut header = table.row();
            for h in &report.table.headers {
                header.push_element(elements::Paragraph::new(h.clone()).styled(style_bold));
            }
            header.push()?;

            let style_cell = style::Style::new().with_font_size(font_size);
            for row in &report.table.rows {
                let mut table_row = table.row();
                for cell in row {
                    table_row.push_element(elements::Paragraph::new(cell.clone()).styled(style_cell));
                }
                table_row.push()?;
            }
            doc.push(table);
        }

        // --- TOTAIS ---
        if !report.totals.is_empty() {
            doc.push(elements::Break::new(1));
            let last = report.totals.len() - 1;
            for (i, (label, value)) in report.totals.iter().enumerate() {
                let mut paragraph = elements::Paragraph::new(format!("{}: {}", label, value));
                paragraph.set_alignment(Alignment::Right);
                let style = if i == last {
                    style::Style::new().bold().with_font_size(12)
                } else {
                    style::Style::new()
                };
                doc.push(paragraph.styled(style));
            }
        }

        if let Some(notes) = report.notes.as_deref().filter(|n| !n.is_empty()) {
            doc.push(elements::Break::new(1.5));
            doc.push(elements::Paragraph::new(format!("Observaciones: {}", notes)));
        }

        // Renderiza para Buffer (Memória)
        let mut buffer = Vec::new();
        doc.render(&mut buffer)?;
        Ok(buffer)
    }

    /// Etiqueta de 100 × 75 mm com nome, SKU, categoria, preço, barras e QR opcional.
    /// Devolve também a simbologia usada nas barras.
    pub fn product_label(&self, product: &Product, include_qr: bool) -> Result<(Vec<u8>, Symbology), AppError> {
        let symbology = if Symbology::Ean13.validate(&product.barcode).is_ok() {
            Symbology::Ean13
        } else {
            Symbology::Code128
        };
        let modules = symbology.encode(&product.barcode)?;
        let bars = render::bars_image(&modules, 3, 120);

        let mut doc = genpdf::Document::new(self.load_fonts()?);
        doc.set_title(format!("Etiqueta {}", product.code));
        doc.set_paper_size(genpdf::Size::new(100, 75));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(4);
        doc.set_page_decorator(decorator);

        doc.push(
            elements::Paragraph::new(truncate(&product.name, LABEL_NAME_CHARS))
                .styled(style::Style::new().bold().with_font_size(11)),
        );
        doc.push(
            elements::Paragraph::new(format!(
                "SKU: {}   Cat.: {}",
                or_dash(product.sku.as_deref()),
                or_dash(product.category.as_deref())
            ))
            .styled(style::Style::new().with_font_size(8)),
        );
        doc.push(
            elements::Paragraph::new(format_money(product.price))
                .styled(style::Style::new().bold().with_font_size(12)),
        );

        doc.push(
            elements::Image::from_dynamic_image(DynamicImage::ImageLuma8(bars))?
                .with_alignment(Alignment::Center),
        );
        let mut digits = elements::Paragraph::new(product.barcode.clone());
        digits.set_alignment(Alignment::Center);
        doc.push(digits.styled(style::Style::new().with_font_size(8)));

        if include_qr {
            let qr = render::qr_image(&product.qr_code, 4, render::ErrorCorrection::M)?;
            doc.push(
                elements::Image::from_dynamic_image(DynamicImage::ImageLuma8(qr))?
                    .with_alignment(Alignment::Center),
            );
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer)?;
        Ok((buffer, symbology))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        audit::{AppModule, AuditAction},
        orders::{OrderKind, OrderLine, OrderStatus},
        sales::{Sale, SaleLine, SaleSummary},
    };
    use chrono::{NaiveDate, TimeZone};
    use uuid::Uuid;

    fn d(v: &str) -> Decimal {
        v.parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn money_is_grouped_by_thousands() {
        assert_eq!(format_money(d("1234567.891")), "$1,234,567.89");
        assert_eq!(format_money(d("999")), "$999.00");
        assert_eq!(format_money(d("1000")), "$1,000.00");
        assert_eq!(format_money(d("-5")), "-$5.00");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Anulación de la venta VEN-2025-0001 por error", 30).chars().count(), 30);
        assert_eq!(truncate("corto", 30), "corto");
    }

    #[test]
    fn rows_are_padded_to_the_header() {
        let mut table = ReportTable::new(&[("A", 1), ("B", 2), ("C", 1)]);
        table.push_row(vec!["1".into()]);
        table.push_row(vec!["1".into(), "2".into(), "3".into(), "4".into()]);
        assert_eq!(table.rows[0], vec!["1", "", ""]);
        assert_eq!(table.rows[1].len(), 3);
        assert_eq!(table.weights, vec![1, 2, 1]);
    }

    #[test]
    fn invoice_carries_lines_and_totals() {
        let sale = Sale {
            id: Uuid::new_v4(),
            number: "VEN-2025-0007".into(),
            client_id: None,
            subtotal: d("200"),
            iva_percent: d("19.00"),
            iva: d("38"),
            discount: d("8"),
            total: d("230"),
            status: SaleStatus::Annulled,
            notes: Some("Entrega en bodega".into()),
            seller_id: None,
            annulled_by: None,
            annulled_at: None,
            created_at: now(),
        };
        let detail = SaleDetail {
            summary: SaleSummary {
                sale,
                client_name: Some("Oficinas SAS".into()),
                client_document: Some("900123".into()),
                seller_name: None,
            },
            lines: vec![SaleLine {
                id: Uuid::new_v4(),
                sale_id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                description: "Silla ejecutiva".into(),
                quantity: 2,
                unit_price: d("100"),
                subtotal: d("200"),
            }],
        };

        let doc = sale_invoice(&detail, "admin", now());
        assert_eq!(doc.title, "FACTURA DE VENTA");
        assert_eq!(doc.subtitle.as_deref(), Some("VEN-2025-0007"));
        assert_eq!(doc.table.rows, vec![vec!["Silla ejecutiva", "2", "$100.00", "$200.00"]]);
        assert!(doc.header.contains(&("Estado".to_string(), "ANULADA".to_string())));
        assert_eq!(
            doc.totals,
            vec![
                ("Subtotal".to_string(), "$200.00".to_string()),
                ("IVA (19%)".to_string(), "$38.00".to_string()),
                ("Descuento".to_string(), "$8.00".to_string()),
                ("TOTAL".to_string(), "$230.00".to_string()),
            ]
        );
        assert!(!doc.landscape);
    }

    #[test]
    fn order_document_uses_kind_title() {
        let order = PurchaseOrder {
            id: Uuid::new_v4(),
            number: "OP-2025-0003".into(),
            kind: OrderKind::Supplier,
            supplier_id: None,
            supplier_name: "Maderas del Norte".into(),
            supplier_address: None,
            supplier_phone: None,
            issue_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            client_order_number: None,
            client_branch: None,
            subtotal: d("50"),
            iva_percent: d("19"),
            iva: d("9.5"),
            discount: Decimal::ZERO,
            total: d("59.5"),
            status: OrderStatus::Pending,
            notes: None,
            prepared_by: None,
            verified_by: None,
            created_at: now(),
            updated_at: now(),
        };
        let detail = OrderDetail {
            lines: vec![OrderLine {
                id: Uuid::new_v4(),
                order_id: order.id,
                position: 1,
                description: "Tablero MDF".into(),
                quantity: d("2.50"),
                unit: "M2".into(),
                unit_price: d("20"),
                subtotal: d("50"),
            }],
            order,
            prepared_by_name: Some("Astrid".into()),
            verified_by_name: None,
        };

        let doc = order_document(&detail, "astrid", now());
        assert_eq!(doc.title, "ORDEN A PROVEEDOR");
        assert_eq!(doc.table.rows[0][2], "2.5");
        assert!(doc.header.contains(&("Verificó".to_string(), "-".to_string())));
        assert_eq!(doc.totals.last().unwrap().1, "$59.50");
    }

    #[test]
    fn audit_export_is_landscape_and_truncated() {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            username: "admin".into(),
            action: AuditAction::Delete,
            module: AppModule::Inventory,
            description: Some("Eliminó el producto SIL-001 Silla ejecutiva gerencial".into()),
            ip_address: None,
            created_at: now(),
        };
        let entries = vec![entry; AUDIT_EXPORT_ROWS + 20];

        let doc = audit_report(&entries, "admin", now());
        assert!(doc.landscape);
        assert_eq!(doc.table.rows.len(), AUDIT_EXPORT_ROWS);
        assert_eq!(doc.table.rows[0][2], "DELETE");
        assert_eq!(doc.table.rows[0][3], "INVENTORY");
        assert_eq!(doc.table.rows[0][4].chars().count(), AUDIT_DESCRIPTION_CHARS);
    }

    #[test]
    fn missing_fonts_are_reported() {
        let service = DocumentService::new("/nonexistent/fonts".into(), "Roboto".into(), "BUTACORS".into());
        let doc = ReportDocument::new("X", ReportTable::new(&[("A", 1)]), "admin", now());
        assert!(matches!(service.render(&doc), Err(AppError::FontNotFound(_))));
    }
}
