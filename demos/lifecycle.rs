/// lifecycle - a collateralized loan settled against an in-memory ledger
use loan_agreement_rs::chrono::{Duration, TimeZone, Utc};
use loan_agreement_rs::{
    Custody, Ledger, LoanBook, Money, PartyId, Rate, SafeTimeProvider, TermSheet, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    let control = time.test_control().expect("test clock");

    let lender = PartyId::from("bank");
    let borrower = PartyId::from("alice");

    let mut ledger = Ledger::new();
    ledger.deposit(lender.clone(), Money::new(5_000_000));
    ledger.deposit(borrower.clone(), Money::new(1_000_000));

    let book = LoanBook::new();
    let id = book.open(lender.clone(), &time)?;

    book.with_loan(id, |loan| {
        let sheet = TermSheet::builder()
            .borrower(borrower.clone())
            .principal(Money::new(2_000_000))
            .apr(Rate::from_bps(850))
            .collateral_req(Money::new(500_000))
            .late_fee(Money::new(2_500))
            .prepayment_penalty(Money::new(10_000))
            .prepayment_period(86_400 * 90)
            .sliding_scale_prepayment_penalty(true)
            .grace_period(86_400 * 7)
            .time_before_default(86_400 * 30)
            .term(86_400 * 180)
            .build()?;
        loan.set_terms(&lender, sheet, &time)?;
        loan.pledge_collateral(&borrower, Money::new(500_000), &time)?;
        loan.fund_and_issue_loan(&lender, Money::new(2_000_000), &time)?;
        ledger.apply_all(&loan.take_settlements())
    })?;

    println!("=== after issuance ===");
    println!("lender free:      {}", ledger.balance(&lender));
    println!("borrower free:    {}", ledger.balance(&borrower));
    println!("borrower locked:  {}", ledger.locked_balance(&borrower));

    // monthly partial payments
    for month in 1..=3 {
        control.advance(Duration::days(30));
        book.with_loan(id, |loan| {
            let outcome = loan.make_payment(&borrower, Money::new(400_000), &time)?;
            println!(
                "month {}: interest {} principal {} remaining {}",
                month,
                outcome.application.to_interest,
                outcome.application.to_principal,
                outcome.remaining_balance
            );
            ledger.apply_all(&loan.take_settlements())
        })?;
    }

    // pay off the rest at maturity
    control.advance(Duration::days(90));
    book.with_loan(id, |loan| {
        let payoff = loan.payoff_amount(&time)?;
        let outcome = loan.make_payment(&borrower, payoff, &time)?;
        println!("final payment {} -> {:?}", payoff, outcome.status);
        ledger.apply_all(&loan.take_settlements())?;
        println!("{}", loan.to_json_pretty(&time)?);
        Ok(())
    })?;

    println!("=== after repayment ===");
    println!("lender free:      {}", ledger.balance(&lender));
    println!("borrower free:    {}", ledger.balance(&borrower));
    println!("borrower locked:  {}", ledger.locked_balance(&borrower));
    println!("ledger total:     {}", ledger.total());

    Ok(())
}
