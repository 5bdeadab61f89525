//! Order history and invoice route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use clementine_core::OrderId;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::invoice::{self, InvoiceDocument};
use crate::state::AppState;

/// One order line for the history page.
#[derive(Clone)]
pub struct OrderLineView {
    pub title: String,
    pub quantity: u32,
    pub line_total: String,
}

/// One order for the history page.
#[derive(Clone)]
pub struct OrderView {
    pub id: OrderId,
    pub placed_at: String,
    pub total: String,
    pub lines: Vec<OrderLineView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            placed_at: order.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            total: order.total().to_string(),
            lines: order
                .lines
                .iter()
                .map(|line| OrderLineView {
                    title: line.product.title.clone(),
                    quantity: line.quantity,
                    line_total: line.line_total().to_string(),
                })
                .collect(),
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub orders: Vec<OrderView>,
    pub logged_in: bool,
}

/// Display the buyer's order history, newest first.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_buyer(current.id)
        .await?;

    Ok(OrdersTemplate {
        orders: orders.iter().map(OrderView::from).collect(),
        logged_in: true,
    })
}

/// Generate and stream the PDF invoice for one order.
///
/// Only the buyer may fetch it. The bytes are written to
/// `invoices/<order_id>.pdf` as a side effect; a failed write is logged and
/// the response streams anyway.
pub async fn invoice(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    let order_id = OrderId::new(id);

    let order = OrderRepository::new(state.pool())
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    if order.buyer.user_id != current.id {
        return Err(AppError::Forbidden(format!(
            "order {order_id} belongs to another buyer"
        )));
    }

    let document = InvoiceDocument::from_order(&order);
    let bytes = invoice::render_pdf(&document)?;

    if let Err(e) = state.invoices().persist_if_absent(order_id, &bytes).await {
        tracing::warn!(order_id = %order_id, "failed to persist invoice file: {e}");
    }

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"invoice-{order_id}.pdf\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
