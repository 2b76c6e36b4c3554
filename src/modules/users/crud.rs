use sqlx::{Executor, MySql};

use crate::config::DbPool;

use super::model::{NewProfile, NewUser, User, UserView};

const VIEW_SELECT: &str = r#"
    SELECT users.id, users.email, users.phone, users.role, users.status,
           users.last_login_at,
           user_profiles.first_name, user_profiles.last_name, user_profiles.avatar_url
    FROM users
    LEFT JOIN user_profiles ON user_profiles.user_id = users.id
"#;

pub struct UserCrud {
    pool: DbPool,
}

impl UserCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone = ?")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_id(&self, id: u64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_view_by_id(&self, id: u64) -> Result<Option<UserView>, sqlx::Error> {
        let sql = format!("{VIEW_SELECT} WHERE users.id = ?");
        sqlx::query_as::<_, UserView>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(result.0 > 0)
    }

    pub async fn phone_exists(&self, phone: &str) -> Result<bool, sqlx::Error> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE phone = ?")
            .bind(phone)
            .fetch_one(&self.pool)
            .await?;
        Ok(result.0 > 0)
    }

    pub async fn update_last_login(&self, user_id: u64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Transactional writers: callers thread the transaction handle through
    // =========================================================================

    pub async fn create_user<'e, E>(&self, executor: E, user: &NewUser) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        let result = sqlx::query(
            "INSERT INTO users (email, phone, password_hash, role, status) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.status)
        .execute(executor)
        .await?;

        Ok(result.last_insert_id())
    }

    pub async fn create_profile<'e, E>(
        &self,
        executor: E,
        user_id: u64,
        profile: &NewProfile,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        sqlx::query(
            "INSERT INTO user_profiles (user_id, first_name, last_name, avatar_url) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.avatar_url)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn create_wallet<'e, E>(&self, executor: E, user_id: u64) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        sqlx::query("INSERT INTO wallets (user_id, balance) VALUES (?, 0.00)")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn create_provider_record<'e, E>(
        &self,
        executor: E,
        user_id: u64,
        business_name: &str,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        sqlx::query("INSERT INTO service_providers (user_id, business_name) VALUES (?, ?)")
            .bind(user_id)
            .bind(business_name)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn create_service_admin_record<'e, E>(
        &self,
        executor: E,
        user_id: u64,
        department: Option<&str>,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        sqlx::query("INSERT INTO service_admins (user_id, department) VALUES (?, ?)")
            .bind(user_id)
            .bind(department)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn create_super_admin_record<'e, E>(
        &self,
        executor: E,
        user_id: u64,
        notes: Option<&str>,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        sqlx::query("INSERT INTO super_admins (user_id, notes) VALUES (?, ?)")
            .bind(user_id)
            .bind(notes)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn update_password_hash<'e, E>(
        &self,
        executor: E,
        user_id: u64,
        password_hash: &str,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
