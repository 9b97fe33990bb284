use pay_session::{
    gateway::{BalanceResult, Order},
    session::BalanceView,
};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

pub fn format_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders".to_string();
    }
    let mut table = Table::new();
    table.set_format(markdown_format());
    table.set_titles(row!["Order id", "Amount", "Status", "Description", "Created At", "Updated At"]);
    orders.iter().for_each(|order| {
        table.add_row(row![
            order.id,
            order.amount.map(|a| a.to_string()).unwrap_or_default(),
            order.status,
            order.description.as_deref().unwrap_or_default(),
            order.created_at.as_deref().unwrap_or_default(),
            order.updated_at.as_deref().unwrap_or_default()
        ]);
    });
    table.to_string()
}

pub fn format_balance(result: &BalanceResult) -> String {
    let user = result.user_id.map(|u| u.to_string()).unwrap_or_else(|| "?".into());
    format!("Balance for user {user}: {}", BalanceView::from(result.balance))
}
