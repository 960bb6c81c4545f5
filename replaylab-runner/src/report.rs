//! Plain-text run report.
//!
//! Money and percentages are shown at two places, rounded half-up. A metric
//! with no defined value prints as `n/a`.

use replaylab_core::decimal::{DecimalExt, REPORT_SCALE};
use replaylab_core::BacktestResult;
use rust_decimal::Decimal;

const NA: &str = "n/a";

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_half_up(REPORT_SCALE))
}

fn percent(value: Decimal) -> String {
    format!("{:.2}%", value.round_half_up(REPORT_SCALE))
}

fn or_na(value: Option<Decimal>, fmt: fn(Decimal) -> String) -> String {
    value.map_or_else(|| NA.to_string(), fmt)
}

fn holding(secs: Option<i64>) -> String {
    match secs {
        None => NA.to_string(),
        Some(s) => format!("{}d {}h", s / 86_400, (s % 86_400) / 3_600),
    }
}

/// Render the human-readable summary of a finished run.
pub fn render_report(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let mut report = format!(
        "ReplayLab backtest report\n\
=========================\n\
Strategy        {} ({})\n\
Symbol          {}\n\
Period          {} -> {}\n\
Bars            {} (warm-up {}, replayed {})\n",
        result.strategy_name,
        result.strategy_description,
        result.symbol,
        result.first_bar,
        result.last_bar,
        result.total_bars,
        result.warmup_bars,
        result.bars_processed,
    );

    report.push_str(&format!(
        "\nCapital\n\
Initial         {}\n\
Final           {}\n\
Total P&L       {}\n\
Total return    {}\n\
Annualized      {}\n\
Max drawdown    {}\n\
Sharpe          {}\n",
        money(m.initial_capital),
        money(m.final_capital),
        money(m.total_pnl),
        percent(m.total_return),
        or_na(m.annualized_return, percent),
        percent(m.max_drawdown),
        or_na(m.sharpe_ratio, money),
    ));

    report.push_str(&format!(
        "\nTrades\n\
Total           {}\n\
Winning         {}\n\
Losing          {}\n\
Win rate        {}\n\
Avg profit      {}\n\
Avg loss        {}\n\
Profit factor   {}\n\
Largest win     {}\n\
Largest loss    {}\n\
Commission      {}\n\
Avg holding     {}\n",
        m.total_trades,
        m.winning_trades,
        m.losing_trades,
        or_na(m.win_rate, percent),
        or_na(m.avg_profit, money),
        or_na(m.avg_loss, money),
        or_na(m.profit_factor, money),
        or_na(m.largest_win, money),
        or_na(m.largest_loss, money),
        money(m.total_commission),
        holding(m.avg_holding_secs),
    ));

    if !result.trades.is_empty() {
        report.push_str("\nTrade tape\n");
        for t in &result.trades {
            report.push_str(&format!(
                "  #{} {} {} @ {} -> {} @ {}  qty {}  P&L {} ({})  [{} / {}]\n",
                t.id,
                t.side,
                t.entry_time,
                t.entry_price,
                t.exit_time,
                t.exit_price,
                t.quantity,
                money(t.profit_loss),
                percent(t.profit_loss_percent),
                t.entry_reason,
                t.exit_reason,
            ));
        }
    }

    if !result.warnings.is_empty() {
        report.push_str(&format!("\nWarnings ({})\n", result.warnings.len()));
        for w in &result.warnings {
            report.push_str(&format!(
                "  bar {} at {}: {}\n",
                w.bar_index, w.timestamp, w.message
            ));
        }
    }
    report
}
