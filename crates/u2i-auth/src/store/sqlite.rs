use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::AuthStore;
use crate::error::AuthError;
use crate::types::*;

const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

pub struct SqliteAuthStore {
    conn: Mutex<Connection>,
}

impl SqliteAuthStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: &str) -> Result<Self, AuthError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Self::new(conn))
    }

    pub fn open_in_memory() -> Result<Self, AuthError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self::new(conn))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, AuthError> {
        self.conn
            .lock()
            .map_err(|_| AuthError::Internal("auth store connection poisoned".into()))
    }
}

const MIGRATE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS auth_permissions (
    id TEXT PRIMARY KEY,
    name TEXT UNIQUE NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS auth_roles (
    id TEXT PRIMARY KEY,
    name TEXT UNIQUE NOT NULL,
    display_name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    level INTEGER NOT NULL DEFAULT 0 CHECK (level BETWEEN 0 AND 100),
    is_active INTEGER NOT NULL DEFAULT 1,
    is_system INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS auth_role_permissions (
    role_id TEXT NOT NULL REFERENCES auth_roles(id) ON DELETE CASCADE,
    permission_id TEXT NOT NULL REFERENCES auth_permissions(id),
    PRIMARY KEY (role_id, permission_id)
);

CREATE TABLE IF NOT EXISTS auth_users (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    role_id TEXT NOT NULL REFERENCES auth_roles(id),
    is_active INTEGER NOT NULL DEFAULT 1,
    last_login TEXT,
    phone TEXT,
    avatar TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_auth_users_role ON auth_users(role_id);
CREATE INDEX IF NOT EXISTS idx_auth_roles_level ON auth_roles(level DESC);

CREATE TABLE IF NOT EXISTS auth_settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'general',
    description TEXT NOT NULL DEFAULT '',
    is_modifiable INTEGER NOT NULL DEFAULT 1,
    last_modified_by TEXT REFERENCES auth_users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

const PERMISSION_COLUMNS: &str =
    "p.id, p.name, p.description, p.category, p.is_active, p.created_at, p.updated_at";
const ROLE_COLUMNS: &str = "id, name, display_name, description, level, is_active, is_system, created_at, updated_at";
const USER_COLUMNS: &str = "id, username, email, first_name, last_name, role_id, is_active, last_login, phone, avatar, created_at, updated_at";
const SETTING_COLUMNS: &str = "key, value, category, description, is_modifiable, last_modified_by, created_at, updated_at";

fn conversion_error<E>(idx: usize, ty: rusqlite::types::Type, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
}

fn permission_from_row(row: &Row<'_>) -> rusqlite::Result<Permission> {
    let category: String = row.get(3)?;
    Ok(Permission {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: category
            .parse()
            .map_err(|e| conversion_error(3, rusqlite::types::Type::Text, e))?,
        is_active: row.get::<_, i32>(4)? != 0,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn role_from_row(row: &Row<'_>) -> rusqlite::Result<Role> {
    let level: i64 = row.get(4)?;
    Ok(Role {
        id: row.get(0)?,
        name: row.get(1)?,
        display_name: row.get(2)?,
        description: row.get(3)?,
        level: u8::try_from(level)
            .map_err(|e| conversion_error(4, rusqlite::types::Type::Integer, e))?,
        is_active: row.get::<_, i32>(5)? != 0,
        is_system: row.get::<_, i32>(6)? != 0,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        role_id: row.get(5)?,
        is_active: row.get::<_, i32>(6)? != 0,
        last_login: row.get(7)?,
        phone: row.get(8)?,
        avatar: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn setting_from_row(row: &Row<'_>) -> rusqlite::Result<Setting> {
    let value: String = row.get(1)?;
    let category: String = row.get(2)?;
    Ok(Setting {
        key: row.get(0)?,
        value: serde_json::from_str(&value)
            .map_err(|e| conversion_error(1, rusqlite::types::Type::Text, e))?,
        category: category
            .parse()
            .map_err(|e| conversion_error(2, rusqlite::types::Type::Text, e))?,
        description: row.get(3)?,
        is_modifiable: row.get::<_, i32>(4)? != 0,
        last_modified_by: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn constraint_code(e: &rusqlite::Error) -> Option<i32> {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => Some(err.extended_code),
        _ => None,
    }
}

fn not_found(what: &str) -> impl Fn(rusqlite::Error) -> AuthError + '_ {
    move |e| match e {
        rusqlite::Error::QueryReturnedNoRows => AuthError::NotFound(format!("{what} not found")),
        _ => AuthError::Database(e.to_string()),
    }
}

fn query_permission(conn: &Connection, name: &str) -> Result<Permission, AuthError> {
    conn.query_row(
        &format!("SELECT {PERMISSION_COLUMNS} FROM auth_permissions p WHERE p.name = ?1"),
        [name],
        permission_from_row,
    )
    .map_err(not_found("permission"))
}

fn query_role(conn: &Connection, column: &str, value: &str) -> Result<Role, AuthError> {
    conn.query_row(
        &format!("SELECT {ROLE_COLUMNS} FROM auth_roles WHERE {column} = ?1"),
        [value],
        role_from_row,
    )
    .map_err(not_found("role"))
}

fn query_user(conn: &Connection, id: &str) -> Result<User, AuthError> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM auth_users WHERE id = ?1"),
        [id],
        user_from_row,
    )
    .map_err(not_found("user"))
}

fn query_setting(conn: &Connection, key: &str) -> Result<Setting, AuthError> {
    conn.query_row(
        &format!("SELECT {SETTING_COLUMNS} FROM auth_settings WHERE key = ?1"),
        [key],
        setting_from_row,
    )
    .map_err(not_found("setting"))
}

/// Map permission names to row ids, collapsing duplicates. Any unknown name
/// fails the whole set.
fn resolve_permission_ids(conn: &Connection, names: &[String]) -> Result<Vec<String>, AuthError> {
    let unique: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    let mut stmt = conn.prepare("SELECT id FROM auth_permissions WHERE name = ?1")?;
    let mut ids = Vec::with_capacity(unique.len());
    for name in unique {
        let id: Option<String> = stmt.query_row([name], |row| row.get(0)).optional()?;
        match id {
            Some(id) => ids.push(id),
            None => return Err(AuthError::InvalidPermissionRef(name.to_string())),
        }
    }
    Ok(ids)
}

fn insert_role_permissions(
    conn: &Connection,
    role_id: &str,
    permission_ids: &[String],
) -> Result<(), AuthError> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO auth_role_permissions (role_id, permission_id) VALUES (?1, ?2)",
    )?;
    for pid in permission_ids {
        stmt.execute(params![role_id, pid])?;
    }
    Ok(())
}

#[async_trait]
impl AuthStore for SqliteAuthStore {
    async fn migrate(&self) -> Result<(), AuthError> {
        let conn = self.conn()?;
        conn.execute_batch(MIGRATE_SQL)?;
        Ok(())
    }

    // --- Permissions ---

    async fn create_permission(
        &self,
        name: &str,
        description: &str,
        category: PermissionCategory,
    ) -> Result<Permission, AuthError> {
        let conn = self.conn()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO auth_permissions (id, name, description, category) VALUES (?1, ?2, ?3, ?4)",
            params![id, name, description, category.as_str()],
        )
        .map_err(|e| match constraint_code(&e) {
            Some(SQLITE_CONSTRAINT_UNIQUE) => {
                AuthError::DuplicateName(format!("permission '{name}' already exists"))
            }
            _ => AuthError::Database(e.to_string()),
        })?;
        query_permission(&conn, name)
    }

    async fn get_permission_by_name(&self, name: &str) -> Result<Permission, AuthError> {
        let conn = self.conn()?;
        query_permission(&conn, name)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, AuthError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM auth_permissions p ORDER BY p.category, p.name"
        ))?;
        let perms = stmt
            .query_map([], permission_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(perms)
    }

    async fn update_permission(
        &self,
        name: &str,
        req: &UpdatePermissionRequest,
    ) -> Result<Permission, AuthError> {
        let conn = self.conn()?;
        if let Some(ref description) = req.description {
            conn.execute(
                "UPDATE auth_permissions SET description = ?1, updated_at = datetime('now') WHERE name = ?2",
                params![description, name],
            )?;
        }
        if let Some(category) = req.category {
            conn.execute(
                "UPDATE auth_permissions SET category = ?1, updated_at = datetime('now') WHERE name = ?2",
                params![category.as_str(), name],
            )?;
        }
        query_permission(&conn, name)
    }

    async fn set_permission_active(
        &self,
        name: &str,
        active: bool,
    ) -> Result<Permission, AuthError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE auth_permissions SET is_active = ?1, updated_at = datetime('now') WHERE name = ?2",
            params![active as i32, name],
        )?;
        if changed == 0 {
            return Err(AuthError::NotFound("permission not found".into()));
        }
        query_permission(&conn, name)
    }

    async fn delete_permission(&self, name: &str) -> Result<(), AuthError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let permission = query_permission(&tx, name)?;
        let references: u64 = tx.query_row(
            "SELECT COUNT(*) FROM auth_role_permissions WHERE permission_id = ?1",
            [&permission.id],
            |row| row.get(0),
        )?;
        if references > 0 {
            return Err(AuthError::PermissionInUse(name.to_string()));
        }
        tx.execute("DELETE FROM auth_permissions WHERE id = ?1", [&permission.id])?;
        tx.commit()?;
        Ok(())
    }

    // --- Roles ---

    async fn create_role(&self, role: &NewRole<'_>) -> Result<Role, AuthError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let id = uuid::Uuid::now_v7().to_string();
        tx.execute(
            "INSERT INTO auth_roles (id, name, display_name, description, level, is_system)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                role.name,
                role.display_name,
                role.description,
                role.level,
                role.is_system as i32
            ],
        )
        .map_err(|e| match constraint_code(&e) {
            Some(SQLITE_CONSTRAINT_UNIQUE) => {
                AuthError::DuplicateName(format!("role '{}' already exists", role.name))
            }
            _ => AuthError::Database(e.to_string()),
        })?;
        let permission_ids = resolve_permission_ids(&tx, role.permissions)?;
        insert_role_permissions(&tx, &id, &permission_ids)?;
        tx.commit()?;
        query_role(&conn, "id", &id)
    }

    async fn get_role(&self, id: &str) -> Result<Role, AuthError> {
        let conn = self.conn()?;
        query_role(&conn, "id", id)
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Role, AuthError> {
        let conn = self.conn()?;
        query_role(&conn, "name", name)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AuthError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ROLE_COLUMNS} FROM auth_roles ORDER BY level DESC, name"
        ))?;
        let roles = stmt
            .query_map([], role_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(roles)
    }

    async fn update_role(&self, id: &str, req: &UpdateRoleRequest) -> Result<Role, AuthError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        if let Some(ref display_name) = req.display_name {
            tx.execute(
                "UPDATE auth_roles SET display_name = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![display_name, id],
            )?;
        }
        if let Some(ref description) = req.description {
            tx.execute(
                "UPDATE auth_roles SET description = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![description, id],
            )?;
        }
        if let Some(level) = req.level {
            tx.execute(
                "UPDATE auth_roles SET level = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![level, id],
            )?;
        }
        if let Some(is_active) = req.is_active {
            tx.execute(
                "UPDATE auth_roles SET is_active = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![is_active as i32, id],
            )?;
        }
        tx.commit()?;
        query_role(&conn, "id", id)
    }

    async fn replace_role_permissions(
        &self,
        role_id: &str,
        permission_names: &[String],
    ) -> Result<(), AuthError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE auth_roles SET updated_at = datetime('now') WHERE id = ?1",
            [role_id],
        )?;
        if changed == 0 {
            return Err(AuthError::NotFound("role not found".into()));
        }
        let permission_ids = resolve_permission_ids(&tx, permission_names)?;
        tx.execute(
            "DELETE FROM auth_role_permissions WHERE role_id = ?1",
            [role_id],
        )?;
        insert_role_permissions(&tx, role_id, &permission_ids)?;
        tx.commit()?;
        Ok(())
    }

    async fn list_role_permissions(&self, role_id: &str) -> Result<Vec<Permission>, AuthError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PERMISSION_COLUMNS}
             FROM auth_permissions p
             JOIN auth_role_permissions rp ON rp.permission_id = p.id
             WHERE rp.role_id = ?1
             ORDER BY p.name"
        ))?;
        let perms = stmt
            .query_map([role_id], permission_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(perms)
    }

    async fn delete_role(&self, id: &str) -> Result<(), AuthError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let role = query_role(&tx, "id", id)?;
        let assigned: u64 = tx.query_row(
            "SELECT COUNT(*) FROM auth_users WHERE role_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        if assigned > 0 {
            return Err(AuthError::RoleInUse(role.name));
        }
        tx.execute("DELETE FROM auth_roles WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(())
    }

    // --- Users ---

    async fn create_user(&self, user: &NewUser<'_>) -> Result<User, AuthError> {
        let conn = self.conn()?;
        let id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO auth_users
                (id, username, email, password_hash, first_name, last_name, role_id, phone)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                user.username,
                user.email,
                user.password_hash,
                user.first_name,
                user.last_name,
                user.role_id,
                user.phone
            ],
        )
        .map_err(|e| match constraint_code(&e) {
            Some(SQLITE_CONSTRAINT_UNIQUE) if e.to_string().contains("email") => {
                AuthError::DuplicateName(format!("email '{}' already in use", user.email))
            }
            Some(SQLITE_CONSTRAINT_UNIQUE) => {
                AuthError::DuplicateName(format!("user '{}' already exists", user.username))
            }
            Some(SQLITE_CONSTRAINT_FOREIGNKEY) => AuthError::NotFound("role not found".into()),
            _ => AuthError::Database(e.to_string()),
        })?;
        query_user(&conn, &id)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<User, AuthError> {
        let conn = self.conn()?;
        query_user(&conn, id)
    }

    async fn get_user_by_login(&self, login: &str) -> Result<User, AuthError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {USER_COLUMNS} FROM auth_users WHERE username = ?1 OR email = lower(?1)"
            ),
            [login],
            user_from_row,
        )
        .map_err(not_found("user"))
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, AuthError> {
        let conn = self.conn()?;
        let pattern = filter
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.to_lowercase()));
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM auth_users
             WHERE (?1 IS NULL
                    OR lower(username) LIKE ?1
                    OR lower(email) LIKE ?1
                    OR lower(first_name) LIKE ?1
                    OR lower(last_name) LIKE ?1)
               AND (?2 IS NULL OR role_id = ?2)
               AND (?3 IS NULL OR is_active = ?3)
             ORDER BY created_at DESC, username"
        ))?;
        let users = stmt
            .query_map(
                params![pattern, filter.role_id, filter.is_active.map(|a| a as i32)],
                user_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn update_user(&self, id: &str, req: &UpdateUserRequest) -> Result<User, AuthError> {
        let conn = self.conn()?;
        if let Some(ref username) = req.username {
            conn.execute(
                "UPDATE auth_users SET username = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![username, id],
            )
            .map_err(|e| match constraint_code(&e) {
                Some(SQLITE_CONSTRAINT_UNIQUE) => {
                    AuthError::DuplicateName(format!("user '{username}' already exists"))
                }
                _ => AuthError::Database(e.to_string()),
            })?;
        }
        if let Some(ref email) = req.email {
            conn.execute(
                "UPDATE auth_users SET email = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![email, id],
            )
            .map_err(|e| match constraint_code(&e) {
                Some(SQLITE_CONSTRAINT_UNIQUE) => {
                    AuthError::DuplicateName(format!("email '{email}' already in use"))
                }
                _ => AuthError::Database(e.to_string()),
            })?;
        }
        if let Some(ref first_name) = req.first_name {
            conn.execute(
                "UPDATE auth_users SET first_name = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![first_name, id],
            )?;
        }
        if let Some(ref last_name) = req.last_name {
            conn.execute(
                "UPDATE auth_users SET last_name = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![last_name, id],
            )?;
        }
        if let Some(ref phone) = req.phone {
            conn.execute(
                "UPDATE auth_users SET phone = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![phone, id],
            )?;
        }
        if let Some(ref avatar) = req.avatar {
            conn.execute(
                "UPDATE auth_users SET avatar = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![avatar, id],
            )?;
        }
        query_user(&conn, id)
    }

    async fn set_user_role(&self, id: &str, role_id: &str) -> Result<User, AuthError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE auth_users SET role_id = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![role_id, id],
            )
            .map_err(|e| match constraint_code(&e) {
                Some(SQLITE_CONSTRAINT_FOREIGNKEY) => AuthError::NotFound("role not found".into()),
                _ => AuthError::Database(e.to_string()),
            })?;
        if changed == 0 {
            return Err(AuthError::NotFound("user not found".into()));
        }
        query_user(&conn, id)
    }

    async fn set_user_active(&self, id: &str, active: bool) -> Result<User, AuthError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE auth_users SET is_active = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![active as i32, id],
        )?;
        if changed == 0 {
            return Err(AuthError::NotFound("user not found".into()));
        }
        query_user(&conn, id)
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<(), AuthError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE auth_users SET password_hash = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![password_hash, id],
        )?;
        if changed == 0 {
            return Err(AuthError::NotFound("user not found".into()));
        }
        Ok(())
    }

    async fn get_password_hash(&self, user_id: &str) -> Result<String, AuthError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT password_hash FROM auth_users WHERE id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .map_err(not_found("user"))
    }

    async fn touch_last_login(&self, user_id: &str) -> Result<(), AuthError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE auth_users SET last_login = datetime('now') WHERE id = ?1",
            [user_id],
        )?;
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<(), AuthError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM auth_users WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(AuthError::NotFound("user not found".into()));
        }
        Ok(())
    }

    async fn user_count(&self) -> Result<u64, AuthError> {
        let conn = self.conn()?;
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM auth_users", [], |row| row.get(0))?;
        Ok(count)
    }

    // --- Settings ---

    async fn create_setting(
        &self,
        req: &CreateSettingRequest,
        modified_by: Option<&str>,
    ) -> Result<Setting, AuthError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO auth_settings (key, value, category, description, is_modifiable, last_modified_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                req.key,
                req.value.to_string(),
                req.category.as_str(),
                req.description,
                req.is_modifiable as i32,
                modified_by
            ],
        )
        .map_err(|e| match constraint_code(&e) {
            Some(SQLITE_CONSTRAINT_UNIQUE) | Some(SQLITE_CONSTRAINT_PRIMARYKEY) => {
                AuthError::DuplicateName(format!("setting '{}' already exists", req.key))
            }
            Some(SQLITE_CONSTRAINT_FOREIGNKEY) => AuthError::NotFound("user not found".into()),
            _ => AuthError::Database(e.to_string()),
        })?;
        query_setting(&conn, &req.key)
    }

    async fn get_setting(&self, key: &str) -> Result<Setting, AuthError> {
        let conn = self.conn()?;
        query_setting(&conn, key)
    }

    async fn list_settings(&self) -> Result<Vec<Setting>, AuthError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SETTING_COLUMNS} FROM auth_settings ORDER BY category, key"
        ))?;
        let settings = stmt
            .query_map([], setting_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(settings)
    }

    async fn update_setting(
        &self,
        key: &str,
        req: &UpdateSettingRequest,
        modified_by: Option<&str>,
    ) -> Result<Setting, AuthError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let changed = tx
            .execute(
                "UPDATE auth_settings SET last_modified_by = ?1, updated_at = datetime('now')
                 WHERE key = ?2",
                params![modified_by, key],
            )
            .map_err(|e| match constraint_code(&e) {
                Some(SQLITE_CONSTRAINT_FOREIGNKEY) => AuthError::NotFound("user not found".into()),
                _ => AuthError::Database(e.to_string()),
            })?;
        if changed == 0 {
            return Err(AuthError::NotFound("setting not found".into()));
        }
        if let Some(ref value) = req.value {
            tx.execute(
                "UPDATE auth_settings SET value = ?1 WHERE key = ?2",
                params![value.to_string(), key],
            )?;
        }
        if let Some(ref description) = req.description {
            tx.execute(
                "UPDATE auth_settings SET description = ?1 WHERE key = ?2",
                params![description, key],
            )?;
        }
        if let Some(category) = req.category {
            tx.execute(
                "UPDATE auth_settings SET category = ?1 WHERE key = ?2",
                params![category.as_str(), key],
            )?;
        }
        tx.commit()?;
        query_setting(&conn, key)
    }

    async fn delete_setting(&self, key: &str) -> Result<(), AuthError> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM auth_settings WHERE key = ?1", [key])?;
        if changed == 0 {
            return Err(AuthError::NotFound("setting not found".into()));
        }
        Ok(())
    }
}
