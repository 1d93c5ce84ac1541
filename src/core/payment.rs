//! Ledger business logic - Moves funds between user balances.
//!
//! A payment debits the renter and credits the owner for a booking, records
//! the transaction, and is atomic with respect to both balances: either both
//! updates commit or neither does. Balance reads for display go through a
//! short-lived cache; the sufficiency check before a debit always re-reads
//! the store inside the transfer transaction, never the cache, and every
//! transfer invalidates both parties' cache entries before returning.

use crate::{
    cache::LedgerCache,
    entities::{Booking, Transaction, User, transaction, user},
    errors::{Error, Result},
    events::{Event, EventKind, EventSink},
    locks::IdLocks,
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, warn};

/// Status recorded on a settled transaction.
pub const STATUS_COMPLETED: &str = "completed";

/// Adds `delta` to a user's balance with a single atomic UPDATE.
///
/// `UPDATE users SET balance = balance + delta WHERE id = ?` avoids the
/// read-modify-write race that loses updates under concurrent transfers.
async fn adjust_balance_atomic<C>(db: &C, user_id: i64, delta: f64) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).add(delta),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    Ok(())
}

/// Transfers `amount` from the renter to the owner for a booking.
///
/// The amount must be positive, finite, and exactly the booking's total
/// price, and a booking accepts only one completed payment. The payer's
/// balance is re-read fresh inside the transfer transaction - cached reads
/// are for display only - and `InsufficientFunds` leaves both balances and
/// the transaction list untouched. On success both cache entries are
/// invalidated synchronously and a payment event goes to each party.
///
/// A failed payment does not touch the booking: it stays `pending` and
/// reserved, and deciding between retry and cancellation belongs to the
/// caller.
// float_cmp: the caller passes the booking's own total_price through unchanged
#[allow(clippy::float_cmp, clippy::too_many_arguments)]
pub async fn process_payment(
    db: &DatabaseConnection,
    locks: &IdLocks,
    cache: &LedgerCache,
    sink: &dyn EventSink,
    booking_id: i64,
    from_user_id: i64,
    to_user_id: i64,
    amount: f64,
) -> Result<transaction::Model> {
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }

    let booking = Booking::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or(Error::BookingNotFound { id: booking_id })?;

    if amount != booking.total_price {
        warn!(
            booking_id,
            amount,
            total_price = booking.total_price,
            "payment amount does not match booking price"
        );
        return Err(Error::InvalidAmount { amount });
    }

    // Serialize balance mutations for both parties; ascending-id order keeps
    // concurrent pair acquisitions deadlock-free.
    let _guards = locks.acquire_pair(from_user_id, to_user_id).await;

    let txn = db.begin().await?;

    // Checked under the locks so a concurrent payment for the same booking
    // cannot slip in a second completed transaction
    let already_paid = Transaction::find()
        .filter(transaction::Column::BookingId.eq(booking_id))
        .filter(transaction::Column::Status.eq(STATUS_COMPLETED))
        .count(&txn)
        .await?;
    if already_paid > 0 {
        return Err(Error::AlreadyPaid { booking_id });
    }

    let payer = User::find_by_id(from_user_id)
        .one(&txn)
        .await?
        .ok_or(Error::UserNotFound { id: from_user_id })?;

    User::find_by_id(to_user_id)
        .one(&txn)
        .await?
        .ok_or(Error::UserNotFound { id: to_user_id })?;

    if payer.balance < amount {
        return Err(Error::InsufficientFunds {
            current: payer.balance,
            required: amount,
        });
    }

    adjust_balance_atomic(&txn, from_user_id, -amount).await?;
    adjust_balance_atomic(&txn, to_user_id, amount).await?;

    let record = transaction::ActiveModel {
        booking_id: Set(booking_id),
        from_user_id: Set(from_user_id),
        to_user_id: Set(to_user_id),
        amount: Set(amount),
        status: Set(STATUS_COMPLETED.to_string()),
        timestamp: Set(Utc::now()),
        ..Default::default()
    };
    let record = record.insert(&txn).await?;

    txn.commit().await?;

    // Cached balances are stale the instant the transfer commits
    cache.invalidate(from_user_id).await;
    cache.invalidate(to_user_id).await;

    info!(
        transaction_id = record.id,
        booking_id, from_user_id, to_user_id, amount, "payment processed"
    );

    sink.emit(Event::new(
        EventKind::Payment,
        from_user_id,
        format!("Payment of ${amount} sent successfully"),
        record.id,
    ));
    sink.emit(Event::new(
        EventKind::Payment,
        to_user_id,
        format!("Payment of ${amount} received"),
        record.id,
    ));

    Ok(record)
}

/// Returns a user's balance, serving a cached value when one is fresh.
///
/// Cached reads feed display surfaces only; nothing on the mutation path
/// consults them.
pub async fn get_balance(
    db: &DatabaseConnection,
    cache: &LedgerCache,
    user_id: i64,
) -> Result<f64> {
    if let Some(balance) = cache.cached_balance(user_id).await {
        return Ok(balance);
    }

    let found = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    cache.store_balance(user_id, found.balance).await;
    Ok(found.balance)
}

/// Returns every transaction a user sent or received, newest first.
pub async fn get_transaction_history(
    db: &DatabaseConnection,
    cache: &LedgerCache,
    user_id: i64,
) -> Result<Vec<transaction::Model>> {
    if let Some(history) = cache.cached_history(user_id).await {
        return Ok(history);
    }

    let history = Transaction::find()
        .filter(
            Condition::any()
                .add(transaction::Column::FromUserId.eq(user_id))
                .add(transaction::Column::ToUserId.eq(user_id)),
        )
        .order_by_desc(transaction::Column::Timestamp)
        .all(db)
        .await?;

    cache.store_history(user_id, history.clone()).await;
    Ok(history)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::booking::{self, BookingStatus};
    use crate::events::{ChannelSink, NullSink};
    use crate::test_utils::*;

    async fn balance_of(db: &DatabaseConnection, user_id: i64) -> f64 {
        User::find_by_id(user_id)
            .one(db)
            .await
            .unwrap()
            .unwrap()
            .balance
    }

    #[tokio::test]
    async fn test_process_payment_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let locks = IdLocks::new();
        let cache = LedgerCache::new();

        for bad_amount in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let result =
                process_payment(&db, &locks, &cache, &NullSink, 1, 1, 2, bad_amount).await;
            assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_process_payment_unknown_booking() -> Result<()> {
        let db = setup_test_db().await?;
        let locks = IdLocks::new();
        let cache = LedgerCache::new();

        let result = process_payment(&db, &locks, &cache, &NullSink, 999, 1, 2, 100.0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::BookingNotFound { id: 999 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_process_payment_rejects_wrong_amount() -> Result<()> {
        let (db, owner, renter, _car, booking) = setup_with_booking().await?;
        let locks = IdLocks::new();
        let cache = LedgerCache::new();

        // Booking totals $150; anything else is rejected
        let result = process_payment(
            &db, &locks, &cache, &NullSink, booking.id, renter.id, owner.id, 100.0,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_payment_atomicity() -> Result<()> {
        let (db, owner, renter, _car, booking) = setup_with_booking().await?;
        let locks = IdLocks::new();
        let cache = LedgerCache::new();

        let renter_before = balance_of(&db, renter.id).await;
        let owner_before = balance_of(&db, owner.id).await;

        let record = process_payment(
            &db,
            &locks,
            &cache,
            &NullSink,
            booking.id,
            renter.id,
            owner.id,
            booking.total_price,
        )
        .await?;

        assert_eq!(record.status, STATUS_COMPLETED);
        assert_eq!(record.amount, booking.total_price);
        assert_eq!(
            balance_of(&db, renter.id).await,
            renter_before - booking.total_price
        );
        assert_eq!(
            balance_of(&db, owner.id).await,
            owner_before + booking.total_price
        );

        // Exactly one completed transaction for the booking
        let count = Transaction::find()
            .filter(transaction::Column::BookingId.eq(booking.id))
            .count(&db)
            .await?;
        assert_eq!(count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_second_payment_rejected() -> Result<()> {
        let (db, owner, renter, _car, booking) = setup_with_booking().await?;
        let locks = IdLocks::new();
        let cache = LedgerCache::new();

        process_payment(
            &db,
            &locks,
            &cache,
            &NullSink,
            booking.id,
            renter.id,
            owner.id,
            booking.total_price,
        )
        .await?;

        let result = process_payment(
            &db,
            &locks,
            &cache,
            &NullSink,
            booking.id,
            renter.id,
            owner.id,
            booking.total_price,
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::AlreadyPaid { .. }));

        // Balances moved exactly once
        assert_eq!(balance_of(&db, renter.id).await, 500.0 - 150.0);
        assert_eq!(balance_of(&db, owner.id).await, 500.0 + 150.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_insufficient_funds_changes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Alice").await?;
        let renter = create_user_with_balance(&db, "Bob", 100.0).await?;
        let car = create_test_car(&db, owner.id).await?; // $50/day
        let booking = create_test_booking(
            &db,
            car.id,
            renter.id,
            utc_date(2024, 3, 1),
            utc_date(2024, 3, 4),
        )
        .await?; // $150 > $100 balance
        let locks = IdLocks::new();
        let cache = LedgerCache::new();

        let result = process_payment(
            &db,
            &locks,
            &cache,
            &NullSink,
            booking.id,
            renter.id,
            owner.id,
            booking.total_price,
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientFunds {
                current: 100.0,
                required: 150.0
            }
        ));

        // Neither balance moved and no transaction was recorded
        assert_eq!(balance_of(&db, renter.id).await, 100.0);
        assert_eq!(balance_of(&db, owner.id).await, 500.0);
        assert_eq!(Transaction::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_payment_notifies_both_parties() -> Result<()> {
        let (db, owner, renter, _car, booking) = setup_with_booking().await?;
        let locks = IdLocks::new();
        let cache = LedgerCache::new();
        let (sink, mut rx) = ChannelSink::new();

        let record = process_payment(
            &db,
            &locks,
            &cache,
            &sink,
            booking.id,
            renter.id,
            owner.id,
            booking.total_price,
        )
        .await?;

        let sent = rx.recv().await.unwrap();
        assert_eq!(sent.kind, EventKind::Payment);
        assert_eq!(sent.user_id, renter.id);
        assert_eq!(sent.related_id, record.id);
        assert!(sent.message.contains("sent"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.user_id, owner.id);
        assert!(received.message.contains("received"));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_balance_serves_and_invalidates_cache() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_user_with_balance(&db, "Alice", 300.0).await?;
        let cache = LedgerCache::new();

        assert_eq!(get_balance(&db, &cache, user.id).await?, 300.0);

        // Mutate the store behind the cache's back; the stale value is served
        adjust_balance_atomic(&db, user.id, 50.0).await?;
        assert_eq!(get_balance(&db, &cache, user.id).await?, 300.0);

        // Invalidate and the fresh value comes through
        cache.invalidate(user.id).await;
        assert_eq!(get_balance(&db, &cache, user.id).await?, 350.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_balance_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = LedgerCache::new();

        let result = get_balance(&db, &cache, 999).await;
        assert!(matches!(result.unwrap_err(), Error::UserNotFound { id: 999 }));

        Ok(())
    }

    #[tokio::test]
    async fn test_transaction_history_both_directions() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "Alice").await?;
        let bob = create_test_user(&db, "Bob").await?;
        let carol = create_test_user(&db, "Carol").await?;
        let car = create_test_car(&db, alice.id).await?;
        let locks = IdLocks::new();
        let cache = LedgerCache::new();

        // Bob pays Alice, then Alice pays Carol for her own rental
        let b1 = create_test_booking(
            &db,
            car.id,
            bob.id,
            utc_date(2024, 3, 1),
            utc_date(2024, 3, 4),
        )
        .await?;
        process_payment(
            &db,
            &locks,
            &cache,
            &NullSink,
            b1.id,
            bob.id,
            alice.id,
            b1.total_price,
        )
        .await?;

        let carol_car = create_test_car(&db, carol.id).await?;
        let b2 = create_test_booking(
            &db,
            carol_car.id,
            alice.id,
            utc_date(2024, 4, 1),
            utc_date(2024, 4, 2),
        )
        .await?;
        process_payment(
            &db,
            &locks,
            &cache,
            &NullSink,
            b2.id,
            alice.id,
            carol.id,
            b2.total_price,
        )
        .await?;

        // Alice appears on both sides, newest first
        let history = get_transaction_history(&db, &cache, alice.id).await?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].booking_id, b2.id);
        assert_eq!(history[1].booking_id, b1.id);

        // Bob only sees his own transfer
        let history = get_transaction_history(&db, &cache, bob.id).await?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].booking_id, b1.id);

        Ok(())
    }

    /// The full marketplace flow: list, book, pay, confirm.
    #[tokio::test]
    async fn test_booking_payment_end_to_end() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db, "Alice").await?;
        let renter = create_user_with_balance(&db, "Bob", 200.0).await?;
        let car = create_test_car(&db, owner.id).await?; // $50/day
        let locks = IdLocks::new();
        let cache = LedgerCache::new();
        let (sink, mut rx) = ChannelSink::new();

        let owner_before = balance_of(&db, owner.id).await;

        let booking = booking::create_booking(
            &db,
            &locks,
            &sink,
            car.id,
            renter.id,
            utc_date(2024, 3, 1),
            utc_date(2024, 3, 4),
        )
        .await?;
        assert_eq!(booking.total_price, 150.0);

        process_payment(
            &db,
            &locks,
            &cache,
            &sink,
            booking.id,
            renter.id,
            owner.id,
            booking.total_price,
        )
        .await?;

        let confirmed =
            booking::update_booking_status(&db, &sink, booking.id, BookingStatus::Confirmed)
                .await?;
        assert_eq!(confirmed.status, "confirmed");

        assert_eq!(balance_of(&db, renter.id).await, 50.0);
        assert_eq!(balance_of(&db, owner.id).await, owner_before + 150.0);

        // Owner got the booking event, both parties the payment events
        let booking_event = rx.recv().await.unwrap();
        assert_eq!(booking_event.kind, EventKind::Booking);
        assert_eq!(booking_event.user_id, owner.id);

        let payment_sent = rx.recv().await.unwrap();
        assert_eq!(payment_sent.kind, EventKind::Payment);
        assert_eq!(payment_sent.user_id, renter.id);

        let payment_received = rx.recv().await.unwrap();
        assert_eq!(payment_received.kind, EventKind::Payment);
        assert_eq!(payment_received.user_id, owner.id);

        Ok(())
    }
}
