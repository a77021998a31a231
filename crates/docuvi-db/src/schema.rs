//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints. Calendar dates (validity windows, document
//! expiry) are ISO `YYYY-MM-DD` strings so range filters compare
//! lexically.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users (reviewer and client accounts)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['Reviewer', 'Client'];
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Clients (contractor companies)
-- =======================================================================
DEFINE TABLE client SCHEMAFULL;
DEFINE FIELD company_name ON TABLE client TYPE string;
DEFINE FIELD contact_email ON TABLE client TYPE string;
DEFINE FIELD contact_phone ON TABLE client TYPE option<string>;
DEFINE FIELD user_id ON TABLE client TYPE option<string>;
DEFINE FIELD active ON TABLE client TYPE bool DEFAULT true;
DEFINE FIELD created_by ON TABLE client TYPE string;
DEFINE FIELD created_at ON TABLE client TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE client TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_client_user ON TABLE client COLUMNS user_id;

-- =======================================================================
-- Document type catalog
-- =======================================================================
DEFINE TABLE document_type SCHEMAFULL;
DEFINE FIELD name ON TABLE document_type TYPE string;
DEFINE FIELD description ON TABLE document_type TYPE option<string>;
DEFINE FIELD active ON TABLE document_type TYPE bool DEFAULT true;
DEFINE FIELD created_by ON TABLE document_type TYPE string;
DEFINE FIELD created_at ON TABLE document_type TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE document_type TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_document_type_name ON TABLE document_type \
    COLUMNS name UNIQUE;

-- =======================================================================
-- Requirements (client <-> document type)
-- =======================================================================
DEFINE TABLE requirement SCHEMAFULL;
DEFINE FIELD client_id ON TABLE requirement TYPE string;
DEFINE FIELD document_type_id ON TABLE requirement TYPE string;
DEFINE FIELD mandatory ON TABLE requirement TYPE bool DEFAULT true;
DEFINE FIELD renewal_months ON TABLE requirement TYPE option<int>;
DEFINE FIELD created_at ON TABLE requirement TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE requirement TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_requirement_pair ON TABLE requirement \
    COLUMNS client_id, document_type_id UNIQUE;

-- =======================================================================
-- Documents (versioned uploads)
-- =======================================================================
DEFINE TABLE document SCHEMAFULL;
DEFINE FIELD requirement_id ON TABLE document TYPE string;
DEFINE FIELD storage_path ON TABLE document TYPE string;
DEFINE FIELD file_name ON TABLE document TYPE string;
DEFINE FIELD version ON TABLE document TYPE int;
DEFINE FIELD status ON TABLE document TYPE string \
    ASSERT $value IN ['Pending', 'Approved', 'Rejected'];
DEFINE FIELD rejection_reason ON TABLE document TYPE option<string>;
DEFINE FIELD uploaded_at ON TABLE document TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD expires_at ON TABLE document TYPE option<string>;
DEFINE FIELD approved_by ON TABLE document TYPE option<string>;
DEFINE FIELD approved_at ON TABLE document TYPE option<datetime>;
DEFINE FIELD deleted ON TABLE document TYPE bool DEFAULT false;
DEFINE FIELD deleted_by ON TABLE document TYPE option<string>;
DEFINE FIELD deleted_at ON TABLE document TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE document TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE document TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_document_requirement ON TABLE document \
    COLUMNS requirement_id;
DEFINE INDEX idx_document_req_version ON TABLE document \
    COLUMNS requirement_id, version UNIQUE;

-- =======================================================================
-- Certificates
-- =======================================================================
DEFINE TABLE certificate SCHEMAFULL;
DEFINE FIELD code ON TABLE certificate TYPE string;
DEFINE FIELD hash ON TABLE certificate TYPE string;
DEFINE FIELD client_id ON TABLE certificate TYPE string;
DEFINE FIELD issued_by ON TABLE certificate TYPE string;
DEFINE FIELD issued_at ON TABLE certificate TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD valid_from ON TABLE certificate TYPE string;
DEFINE FIELD valid_to ON TABLE certificate TYPE string;
DEFINE FIELD status ON TABLE certificate TYPE string \
    ASSERT $value IN ['Active', 'Revoked', 'Expired'];
DEFINE FIELD revocation_reason ON TABLE certificate TYPE option<string>;
DEFINE FIELD revoked_by ON TABLE certificate TYPE option<string>;
DEFINE FIELD revoked_at ON TABLE certificate TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE certificate TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE certificate TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_certificate_code ON TABLE certificate \
    COLUMNS code UNIQUE;
DEFINE INDEX idx_certificate_client ON TABLE certificate \
    COLUMNS client_id;

-- =======================================================================
-- Certificate details (immutable issuance snapshot)
-- =======================================================================
DEFINE TABLE certificate_detail SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete FULL;
DEFINE FIELD certificate_id ON TABLE certificate_detail TYPE string;
DEFINE FIELD requirement_id ON TABLE certificate_detail TYPE string;
DEFINE FIELD document_id ON TABLE certificate_detail TYPE string;
DEFINE FIELD document_type_name ON TABLE certificate_detail TYPE string;
DEFINE FIELD approved_at ON TABLE certificate_detail TYPE datetime;
DEFINE FIELD expires_at ON TABLE certificate_detail TYPE option<string>;
DEFINE FIELD approved_by ON TABLE certificate_detail TYPE string;
DEFINE FIELD created_at ON TABLE certificate_detail TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_certificate_detail_cert ON TABLE certificate_detail \
    COLUMNS certificate_id;

-- =======================================================================
-- Notifications
-- =======================================================================
DEFINE TABLE notification SCHEMAFULL;
DEFINE FIELD user_id ON TABLE notification TYPE string;
DEFINE FIELD kind ON TABLE notification TYPE string \
    ASSERT $value IN ['DocumentApproved', 'DocumentRejected', \
    'DocumentExpiringSoon', 'CertificateIssued', 'CertificateRevoked'];
DEFINE FIELD title ON TABLE notification TYPE string;
DEFINE FIELD message ON TABLE notification TYPE string;
DEFINE FIELD read ON TABLE notification TYPE bool DEFAULT false;
DEFINE FIELD document_id ON TABLE notification TYPE option<string>;
DEFINE FIELD certificate_id ON TABLE notification TYPE option<string>;
DEFINE FIELD created_at ON TABLE notification TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD read_at ON TABLE notification TYPE option<datetime>;
DEFINE INDEX idx_notification_user ON TABLE notification \
    COLUMNS user_id;

-- =======================================================================
-- Audit Log (append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD actor_id ON TABLE audit_log TYPE string;
DEFINE FIELD action ON TABLE audit_log TYPE string;
DEFINE FIELD entity ON TABLE audit_log TYPE string;
DEFINE FIELD entity_id ON TABLE audit_log TYPE option<string>;
-- Structured payload, serialized JSON.
DEFINE FIELD detail ON TABLE audit_log TYPE string DEFAULT '{}';
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_time ON TABLE audit_log COLUMNS timestamp;
DEFINE INDEX idx_audit_actor ON TABLE audit_log COLUMNS actor_id;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
