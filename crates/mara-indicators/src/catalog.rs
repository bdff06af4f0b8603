//! Embedded API catalog.
//!
//! Column lists for the financial statement APIs, in the order the provider
//! documents them. The first API in [`API_ORDER`] that lists a column owns the
//! indicator of that name.

/// Identity columns present on every statement API.
pub const IDENTITY_FIELDS: [&str; 3] = ["ts_code", "ann_date", "end_date"];

/// Columns consulted when choosing between duplicate disclosures.
pub const PRECEDENCE_FIELDS: [&str; 3] = ["report_type", "update_flag", "f_ann_date"];

/// Statement descriptor codes. Text, never indicators.
pub const DESCRIPTOR_FIELDS: [&str; 2] = ["comp_type", "end_type"];

/// Descriptive columns of the security listing.
pub const BASIC_FIELDS: [&str; 6] = ["ts_code", "name", "industry", "market", "area", "list_date"];

/// API lookup order.
pub const API_ORDER: [&str; 4] = ["fina_indicator", "income", "balancesheet", "cashflow"];

/// Static description of one provider API.
#[derive(Debug, Clone, Copy)]
pub struct ApiDefinition {
    /// API name
    pub name: &'static str,
    /// Columns, provider order
    pub fields: &'static [&'static str],
    /// Values accumulate from the start of the fiscal year
    pub cumulative: bool,
}

/// Whether a column is bookkeeping rather than an indicator.
pub fn is_reserved_field(field: &str) -> bool {
    IDENTITY_FIELDS.contains(&field)
        || PRECEDENCE_FIELDS.contains(&field)
        || DESCRIPTOR_FIELDS.contains(&field)
}

/// All embedded API definitions, in lookup order.
pub const fn definitions() -> [ApiDefinition; 4] {
    [FINA_INDICATOR, INCOME, BALANCESHEET, CASHFLOW]
}

/// Financial indicators (ratios, growth rates, per-share figures).
pub const FINA_INDICATOR: ApiDefinition = ApiDefinition {
    name: "fina_indicator",
    cumulative: false,
    fields: &[
        "ts_code",
        "ann_date",
        "end_date",
        "eps",
        "dt_eps",
        "total_revenue_ps",
        "revenue_ps",
        "capital_rese_ps",
        "surplus_rese_ps",
        "undist_profit_ps",
        "extra_item",
        "profit_dedt",
        "gross_margin",
        "current_ratio",
        "quick_ratio",
        "cash_ratio",
        "ar_turn",
        "ca_turn",
        "fa_turn",
        "assets_turn",
        "op_income",
        "ebit",
        "ebitda",
        "fcff",
        "fcfe",
        "bps",
        "ocfps",
        "cfps",
        "ebit_ps",
        "netprofit_margin",
        "grossprofit_margin",
        "profit_to_gr",
        "roe",
        "roe_waa",
        "roe_dt",
        "roa",
        "roic",
        "debt_to_assets",
        "assets_to_eqt",
        "ocf_to_or",
        "q_eps",
        "q_netprofit_margin",
        "q_gsprofit_margin",
        "q_roe",
        "q_dt_roe",
        "q_npta",
        "q_ocf_to_sales",
        "basic_eps_yoy",
        "dt_eps_yoy",
        "cfps_yoy",
        "op_yoy",
        "ebt_yoy",
        "netprofit_yoy",
        "dt_netprofit_yoy",
        "ocf_yoy",
        "roe_yoy",
        "bps_yoy",
        "assets_yoy",
        "eqt_yoy",
        "tr_yoy",
        "or_yoy",
        "q_sales_yoy",
        "q_op_yoy",
        "q_profit_yoy",
        "q_netprofit_yoy",
        "equity_yoy",
        "rd_exp",
        "update_flag",
    ],
};

/// Income statement. Flow figures, reported year-to-date.
pub const INCOME: ApiDefinition = ApiDefinition {
    name: "income",
    cumulative: true,
    fields: &[
        "ts_code",
        "ann_date",
        "f_ann_date",
        "end_date",
        "report_type",
        "comp_type",
        "end_type",
        "basic_eps",
        "diluted_eps",
        "total_revenue",
        "revenue",
        "int_income",
        "prem_earned",
        "comm_income",
        "n_commis_income",
        "total_cogs",
        "oper_cost",
        "int_exp",
        "comm_exp",
        "biz_tax_surchg",
        "sell_exp",
        "admin_exp",
        "fin_exp",
        "assets_impair_loss",
        "operate_profit",
        "non_oper_income",
        "non_oper_exp",
        "total_profit",
        "income_tax",
        "n_income",
        "n_income_attr_p",
        "minority_gain",
        "ebit",
        "ebitda",
        "rd_exp",
        "update_flag",
    ],
};

/// Balance sheet. Point-in-time stocks.
pub const BALANCESHEET: ApiDefinition = ApiDefinition {
    name: "balancesheet",
    cumulative: false,
    fields: &[
        "ts_code",
        "ann_date",
        "f_ann_date",
        "end_date",
        "report_type",
        "comp_type",
        "end_type",
        "total_share",
        "cap_rese",
        "undistr_porfit",
        "surplus_rese",
        "money_cap",
        "trad_asset",
        "notes_receiv",
        "accounts_receiv",
        "oth_receiv",
        "prepayment",
        "inventories",
        "total_cur_assets",
        "fix_assets",
        "cip",
        "intan_assets",
        "goodwill",
        "total_nca",
        "total_assets",
        "st_borr",
        "notes_payable",
        "acct_payable",
        "adv_receipts",
        "total_cur_liab",
        "lt_borr",
        "bond_payable",
        "total_ncl",
        "total_liab",
        "total_hldr_eqy_exc_min_int",
        "total_hldr_eqy_inc_min_int",
        "total_liab_hldr_eqy",
        "update_flag",
    ],
};

/// Cash flow statement. Flow figures, reported year-to-date.
pub const CASHFLOW: ApiDefinition = ApiDefinition {
    name: "cashflow",
    cumulative: true,
    fields: &[
        "ts_code",
        "ann_date",
        "f_ann_date",
        "end_date",
        "comp_type",
        "report_type",
        "end_type",
        "net_profit",
        "finan_exp",
        "c_fr_sale_sg",
        "c_inf_fr_operate_a",
        "c_paid_goods_s",
        "c_paid_to_for_empl",
        "c_paid_for_taxes",
        "st_cash_out_act",
        "n_cashflow_act",
        "c_disp_withdrwl_invest",
        "c_recp_return_invest",
        "c_pay_acq_const_fiolta",
        "stot_inflows_inv_act",
        "stot_out_inv_act",
        "n_cashflow_inv_act",
        "c_recp_borrow",
        "c_prepay_amt_borr",
        "c_pay_dist_dpcp_int_exp",
        "n_cash_flows_fnc_act",
        "n_incr_cash_cash_equ",
        "c_cash_equ_beg_period",
        "c_cash_equ_end_period",
        "free_cashflow",
        "update_flag",
    ],
};
