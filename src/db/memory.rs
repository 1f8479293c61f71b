// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store with typed operations.
//!
//! Provides high-level operations for:
//! - Catalog (books and business plans)
//! - Users (profiles and the email uniqueness index)
//! - Libraries (bookmarks, notes, purchases, offline copies, reading stats)
//! - Payments (checkout attempts keyed by reference)
//!
//! Guards on different maps are only ever nested in the order users,
//! libraries, catalog. Catalog deletes release the catalog guard before
//! sweeping libraries.

use crate::db::Seed;
use crate::error::AppError;
use crate::models::user::email_key;
use crate::models::{
    Book, BusinessPlan, CatalogItem, ContentKind, ContentRef, Payment, PaymentStatus, User,
    UserLibrary, UserRole, UserStatus,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// In-memory database handle. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Tables>,
}

#[derive(Default)]
struct Tables {
    books: DashMap<u64, Book>,
    business_plans: DashMap<u64, BusinessPlan>,
    users: DashMap<u64, User>,
    /// Normalized email -> user id
    emails: DashMap<String, u64>,
    libraries: DashMap<u64, UserLibrary>,
    payments: DashMap<String, Payment>,
    book_seq: AtomicU64,
    plan_seq: AtomicU64,
    user_seq: AtomicU64,
    note_seq: AtomicU64,
}

/// New user fields.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub preferred_categories: Vec<String>,
}

fn sorted_values<T: Clone>(map: &DashMap<u64, T>) -> Vec<T> {
    let mut entries: Vec<(u64, T)> = map
        .iter()
        .map(|e| (*e.key(), e.value().clone()))
        .collect();
    entries.sort_by_key(|(id, _)| *id);
    entries.into_iter().map(|(_, v)| v).collect()
}

impl MemoryDb {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled from a seed.
    pub fn from_seed(seed: Seed) -> Self {
        let db = Self::new();
        let now = crate::time_utils::now_rfc3339();
        let tables = &db.inner;

        for mut book in seed.books {
            book.normalize(&now);
            tables.book_seq.fetch_max(book.id, Ordering::SeqCst);
            tables.books.insert(book.id, book);
        }
        for mut plan in seed.business_plans {
            plan.normalize(&now);
            tables.plan_seq.fetch_max(plan.id, Ordering::SeqCst);
            tables.business_plans.insert(plan.id, plan);
        }
        for mut user in seed.users {
            if user.created_at.is_empty() {
                user.created_at = now.clone();
            }
            tables.user_seq.fetch_max(user.id, Ordering::SeqCst);
            tables.emails.insert(email_key(&user.email), user.id);
            tables.users.insert(user.id, user);
        }

        db
    }

    // ─── Book Operations ─────────────────────────────────────────

    /// All books ordered by id.
    pub fn list_books(&self) -> Vec<Book> {
        sorted_values(&self.inner.books)
    }

    pub fn get_book(&self, id: u64) -> Option<Book> {
        self.inner.books.get(&id).map(|b| b.value().clone())
    }

    /// Insert a book built from a freshly allocated id.
    pub fn create_book(&self, build: impl FnOnce(u64) -> Book) -> Book {
        let id = self.inner.book_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let book = build(id);
        self.inner.books.insert(id, book.clone());
        book
    }

    /// Apply `update` to a book; `None` if it doesn't exist.
    pub fn update_book(&self, id: u64, update: impl FnOnce(&mut Book)) -> Option<Book> {
        let mut book = self.inner.books.get_mut(&id)?;
        update(book.value_mut());
        Some(book.value().clone())
    }

    /// Remove a book and every library reference to it.
    pub fn delete_book(&self, id: u64) -> Option<Book> {
        let (_, book) = self.inner.books.remove(&id)?;
        self.forget_content(&ContentRef::book(id));
        Some(book)
    }

    // ─── Business Plan Operations ────────────────────────────────

    pub fn list_business_plans(&self) -> Vec<BusinessPlan> {
        sorted_values(&self.inner.business_plans)
    }

    pub fn get_business_plan(&self, id: u64) -> Option<BusinessPlan> {
        self.inner.business_plans.get(&id).map(|p| p.value().clone())
    }

    pub fn create_business_plan(&self, build: impl FnOnce(u64) -> BusinessPlan) -> BusinessPlan {
        let id = self.inner.plan_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let plan = build(id);
        self.inner.business_plans.insert(id, plan.clone());
        plan
    }

    /// Apply a fallible `update` to a plan; `None` if it doesn't exist.
    ///
    /// The plan is only replaced when `update` succeeds.
    pub fn update_business_plan(
        &self,
        id: u64,
        update: impl FnOnce(&mut BusinessPlan) -> Result<(), AppError>,
    ) -> Option<Result<BusinessPlan, AppError>> {
        let mut plan = self.inner.business_plans.get_mut(&id)?;
        let mut updated = plan.value().clone();
        Some(update(&mut updated).map(|()| {
            *plan.value_mut() = updated.clone();
            updated
        }))
    }

    pub fn delete_business_plan(&self, id: u64) -> Option<BusinessPlan> {
        let (_, plan) = self.inner.business_plans.remove(&id)?;
        self.forget_content(&ContentRef::business_plan(id));
        Some(plan)
    }

    // ─── Catalog Lookups ─────────────────────────────────────────

    /// Resolve a content reference to the catalog item it names.
    pub fn get_content(&self, content: &ContentRef) -> Option<CatalogItem> {
        match content.kind {
            ContentKind::Book => self.get_book(content.id).map(CatalogItem::Book),
            ContentKind::BusinessPlan => self
                .get_business_plan(content.id)
                .map(CatalogItem::BusinessPlan),
        }
    }

    /// Resolve a content reference or fail with 404.
    pub fn require_content(&self, content: &ContentRef) -> Result<CatalogItem, AppError> {
        self.get_content(content)
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", content.kind, content.id)))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Register a user. Fails with 409 if the email is taken.
    pub fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let key = email_key(&new_user.email);

        let id = match self.inner.emails.entry(key) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!(
                    "Email {} is already registered",
                    new_user.email.trim()
                )))
            }
            Entry::Vacant(slot) => {
                let id = self.inner.user_seq.fetch_add(1, Ordering::SeqCst) + 1;
                slot.insert(id);
                id
            }
        };

        let now = crate::time_utils::now_rfc3339();
        let user = User {
            id,
            name: new_user.name.trim().to_string(),
            email: new_user.email.trim().to_string(),
            role: new_user.role,
            status: UserStatus::Active,
            preferred_categories: new_user.preferred_categories,
            created_at: now.clone(),
            last_active: now,
        };
        self.inner.users.insert(id, user.clone());
        Ok(user)
    }

    pub fn get_user(&self, id: u64) -> Option<User> {
        self.inner.users.get(&id).map(|u| u.value().clone())
    }

    pub fn list_users(&self) -> Vec<User> {
        sorted_values(&self.inner.users)
    }

    pub fn update_user(&self, id: u64, update: impl FnOnce(&mut User)) -> Option<User> {
        let mut user = self.inner.users.get_mut(&id)?;
        update(user.value_mut());
        Some(user.value().clone())
    }

    /// Remove a user together with their library and email reservation.
    ///
    /// Payments are kept for bookkeeping; pending ones are cancelled so a
    /// late gateway confirmation cannot complete them.
    pub fn delete_user(&self, id: u64) -> Option<User> {
        let (_, user) = self.inner.users.remove(&id)?;
        self.inner.emails.remove(&email_key(&user.email));
        self.inner.libraries.remove(&id);
        for mut payment in self.inner.payments.iter_mut() {
            if payment.user_id == id && payment.status == PaymentStatus::Pending {
                payment.status = PaymentStatus::Cancelled;
            }
        }
        Some(user)
    }

    // ─── Library Operations ──────────────────────────────────────

    /// Snapshot of a user's library (empty if they have none yet).
    pub fn get_library(&self, user_id: u64) -> UserLibrary {
        self.inner
            .libraries
            .get(&user_id)
            .map(|l| l.value().clone())
            .unwrap_or_default()
    }

    /// Run `f` with exclusive access to a user's library.
    pub fn with_library<R>(&self, user_id: u64, f: impl FnOnce(&mut UserLibrary) -> R) -> R {
        let mut library = self.inner.libraries.entry(user_id).or_default();
        f(library.value_mut())
    }

    /// Like `with_library`, but only while the user exists.
    ///
    /// Returns `None` for a deleted user instead of creating a library.
    pub fn with_user_library<R>(
        &self,
        user_id: u64,
        f: impl FnOnce(&mut UserLibrary) -> R,
    ) -> Option<R> {
        // Held until `f` returns so delete_user cannot drop the library mid-write
        let _user = self.inner.users.get(&user_id)?;
        let mut library = self.inner.libraries.entry(user_id).or_default();
        Some(f(library.value_mut()))
    }

    /// Run `f` on a user's library with `content` resolved under the same guard.
    ///
    /// Fails with 404 if the content doesn't exist. A concurrent catalog delete
    /// either lands first or sweeps whatever `f` adds.
    pub fn with_library_content<R>(
        &self,
        user_id: u64,
        content: &ContentRef,
        f: impl FnOnce(&mut UserLibrary, CatalogItem) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut library = self.inner.libraries.entry(user_id).or_default();
        let item = self.require_content(content)?;
        f(library.value_mut(), item)
    }

    pub fn next_note_id(&self) -> u64 {
        self.inner.note_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn forget_content(&self, content: &ContentRef) {
        for mut library in self.inner.libraries.iter_mut() {
            library.forget_content(content);
        }
    }

    // ─── Payment Operations ──────────────────────────────────────

    /// Store a new payment. Fails with 409 on a reference collision.
    pub fn insert_payment(&self, payment: Payment) -> Result<(), AppError> {
        match self.inner.payments.entry(payment.reference.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "Payment {} already exists",
                payment.reference
            ))),
            Entry::Vacant(slot) => {
                slot.insert(payment);
                Ok(())
            }
        }
    }

    pub fn get_payment(&self, reference: &str) -> Option<Payment> {
        self.inner.payments.get(reference).map(|p| p.value().clone())
    }

    /// Run `f` with exclusive access to a payment; `None` if it doesn't exist.
    pub fn with_payment<R>(&self, reference: &str, f: impl FnOnce(&mut Payment) -> R) -> Option<R> {
        let mut payment = self.inner.payments.get_mut(reference)?;
        Some(f(payment.value_mut()))
    }

    /// Payments matching the filters, newest first.
    pub fn list_payments(
        &self,
        user_id: Option<u64>,
        status: Option<PaymentStatus>,
    ) -> Vec<Payment> {
        let mut payments: Vec<Payment> = self
            .inner
            .payments
            .iter()
            .filter(|p| user_id.map_or(true, |id| p.user_id == id))
            .filter(|p| status.map_or(true, |s| p.status == s))
            .map(|p| p.value().clone())
            .collect();
        payments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.reference.cmp(&b.reference))
        });
        payments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bookmark, PaymentMethod};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Abebe".to_string(),
            email: email.to_string(),
            role: UserRole::User,
            preferred_categories: vec![],
        }
    }

    #[test]
    fn test_seeded_ids_continue_sequence() {
        let db = MemoryDb::from_seed(Seed::builtin().unwrap());
        let max_id = db.list_books().iter().map(|b| b.id).max().unwrap();

        let book = db.create_book(|id| {
            let mut book = db.get_book(1).unwrap();
            book.id = id;
            book
        });

        assert_eq!(book.id, max_id + 1);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let db = MemoryDb::new();
        db.create_user(new_user("abebe@example.com")).unwrap();

        let err = db.create_user(new_user(" ABEBE@example.com ")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_delete_user_frees_email() {
        let db = MemoryDb::new();
        let user = db.create_user(new_user("abebe@example.com")).unwrap();
        db.with_library(user.id, |lib| {
            lib.bookmarks.push(Bookmark {
                content: ContentRef::book(1),
                created_at: "now".to_string(),
            })
        });

        assert!(db.delete_user(user.id).is_some());
        assert!(db.get_library(user.id).bookmarks.is_empty());
        assert!(db.create_user(new_user("abebe@example.com")).is_ok());
    }

    fn payment(reference: &str, user_id: u64, status: PaymentStatus) -> Payment {
        Payment {
            reference: reference.to_string(),
            user_id,
            content: ContentRef::book(1),
            amount: 150,
            currency: "ETB".to_string(),
            method: PaymentMethod::Telebirr,
            phone_number: None,
            status,
            checkout_url: String::new(),
            transaction_id: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            completed_at: None,
        }
    }

    #[test]
    fn test_delete_user_cancels_pending_payments() {
        let db = MemoryDb::new();
        let user = db.create_user(new_user("abebe@example.com")).unwrap();
        let other = db.create_user(new_user("other@example.com")).unwrap();
        db.insert_payment(payment("SW-1", user.id, PaymentStatus::Pending)).unwrap();
        db.insert_payment(payment("SW-2", user.id, PaymentStatus::Completed)).unwrap();
        db.insert_payment(payment("SW-3", other.id, PaymentStatus::Pending)).unwrap();

        db.delete_user(user.id).unwrap();

        assert_eq!(db.get_payment("SW-1").unwrap().status, PaymentStatus::Cancelled);
        assert_eq!(db.get_payment("SW-2").unwrap().status, PaymentStatus::Completed);
        assert_eq!(db.get_payment("SW-3").unwrap().status, PaymentStatus::Pending);
    }

    #[test]
    fn test_with_user_library_skips_deleted_users() {
        let db = MemoryDb::new();
        let user = db.create_user(new_user("abebe@example.com")).unwrap();
        assert_eq!(db.with_user_library(user.id, |lib| lib.bookmarks.len()), Some(0));

        db.delete_user(user.id).unwrap();
        assert_eq!(db.with_user_library(user.id, |lib| lib.bookmarks.len()), None);
        assert!(!db.inner.libraries.contains_key(&user.id));
    }

    #[test]
    fn test_with_library_content_rejects_missing_content() {
        let db = MemoryDb::from_seed(Seed::builtin().unwrap());
        db.delete_book(3).unwrap();

        let result = db.with_library_content(42, &ContentRef::book(3), |_, _| Ok(()));
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let title = db.with_library_content(42, &ContentRef::book(1), |_, item| Ok(item.title().to_string()));
        assert_eq!(title.unwrap(), "Atomic Habits");
    }

    #[test]
    fn test_bookmark_racing_delete_never_outlives_book() {
        for _ in 0..50 {
            let db = MemoryDb::from_seed(Seed::builtin().unwrap());
            let content = ContentRef::book(3);

            let adder = {
                let db = db.clone();
                std::thread::spawn(move || {
                    let _ = db.with_library_content(42, &content, |lib, _| {
                        lib.bookmarks.push(Bookmark {
                            content,
                            created_at: "now".to_string(),
                        });
                        Ok(())
                    });
                })
            };
            let deleter = {
                let db = db.clone();
                std::thread::spawn(move || db.delete_book(3))
            };
            adder.join().unwrap();
            deleter.join().unwrap();

            assert!(db.get_content(&content).is_none());
            assert!(!db.get_library(42).is_bookmarked(&content));
        }
    }

    #[test]
    fn test_failed_plan_update_keeps_original() {
        let db = MemoryDb::from_seed(Seed::builtin().unwrap());
        let before = db.get_business_plan(1).unwrap();

        let result = db
            .update_business_plan(1, |plan| {
                plan.title = "Half-applied".to_string();
                Err(AppError::BadRequest("rejected".to_string()))
            })
            .unwrap();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(db.get_business_plan(1).unwrap().title, before.title);

        let updated = db
            .update_business_plan(1, |plan| {
                plan.title = "Renamed".to_string();
                Ok(())
            })
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(db.get_business_plan(1).unwrap().title, "Renamed");
        assert!(db.update_business_plan(99, |_| Ok(())).is_none());
    }

    #[test]
    fn test_delete_book_forgets_bookmarks() {
        let db = MemoryDb::from_seed(Seed::builtin().unwrap());
        let content = ContentRef::book(1);
        db.with_library(42, |lib| {
            lib.bookmarks.push(Bookmark {
                content,
                created_at: "now".to_string(),
            })
        });

        assert!(db.delete_book(1).is_some());
        assert!(!db.get_library(42).is_bookmarked(&content));
        assert!(db.get_content(&content).is_none());
    }

    #[test]
    fn test_concurrent_registrations_get_unique_ids() {
        let db = MemoryDb::new();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let db = db.clone();
                std::thread::spawn(move || {
                    db.create_user(new_user(&format!("user{}@example.com", i)))
                        .unwrap()
                        .id
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 16);
    }
}
