//! Form state for the auth screens and the product dialogs.
//!
//! Each form owns its text inputs, the focused field, a pending flag
//! (set while the request is in flight, so a second Enter is ignored)
//! and the last error to display. Rendering lives in the screens.

use stockpile_core::{CoreError, CreateProduct, Credentials, FieldError, Product, UpdateProduct};

pub const CREDENTIALS_REQUIRED: &str = "Email and password are required";
pub const PRODUCT_REQUIRED: &str = "Name and price are required";
pub const STOCK_NOT_A_NUMBER: &str = "Stock must be a whole number";

// ── Inputs ───────────────────────────────────────────────────────────

/// Single-line text input, edited at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn push(&mut self, c: char) {
        self.value.push(c);
    }

    /// Append pasted text; line breaks are dropped.
    pub fn paste(&mut self, text: &str) {
        self.value
            .extend(text.chars().filter(|&c| c != '\n' && c != '\r'));
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// What a failed submit shows under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError {
    pub message: String,
    pub fields: Vec<FieldError>,
}

impl FormError {
    pub fn local(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// The backend's message verbatim, or `fallback` if it sent none.
    pub fn from_core(err: &CoreError, fallback: &str) -> Self {
        let message = err.message();
        Self {
            message: if message.trim().is_empty() {
                fallback.to_owned()
            } else {
                message
            },
            fields: err.fields().to_vec(),
        }
    }
}

// ── Credentials ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialField {
    #[default]
    Email,
    Password,
}

/// Email + password, shared by the login and register screens.
#[derive(Debug, Clone, Default)]
pub struct CredentialsForm {
    pub email: TextInput,
    pub password: TextInput,
    pub focus: CredentialField,
    pending: bool,
    error: Option<FormError>,
}

impl CredentialsForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            CredentialField::Email => CredentialField::Password,
            CredentialField::Password => CredentialField::Email,
        };
    }

    fn active(&mut self) -> &mut TextInput {
        match self.focus {
            CredentialField::Email => &mut self.email,
            CredentialField::Password => &mut self.password,
        }
    }

    pub fn input(&mut self, c: char) {
        if !self.pending {
            self.active().push(c);
        }
    }

    pub fn paste(&mut self, text: &str) {
        if !self.pending {
            self.active().paste(text);
        }
    }

    pub fn backspace(&mut self) {
        if !self.pending {
            self.active().backspace();
        }
    }

    /// Validate and mark the form pending. `None` means nothing to send:
    /// either a request is already in flight or a field is missing.
    pub fn submit(&mut self) -> Option<Credentials> {
        if self.pending {
            return None;
        }
        self.error = None;
        if self.email.is_blank() || self.password.value().is_empty() {
            self.error = Some(FormError::local(CREDENTIALS_REQUIRED));
            return None;
        }
        self.pending = true;
        Some(Credentials::new(
            self.email.value().trim(),
            self.password.value(),
        ))
    }

    pub fn fail(&mut self, error: FormError) {
        self.pending = false;
        self.error = Some(error);
    }

    /// Forget everything, including the typed password.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ── Products ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductField {
    #[default]
    Name,
    Description,
    Price,
    Stock,
}

impl ProductField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Description, Self::Price, Self::Stock];

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Product Name",
            Self::Description => "Description",
            Self::Price => "Price",
            Self::Stock => "Stock",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Name => 0,
            Self::Description => 1,
            Self::Price => 2,
            Self::Stock => 3,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ProductFormMode {
    Create,
    Edit { id: String },
}

/// A validated product form, ready for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductSubmission {
    Create(CreateProduct),
    Update { id: String, update: UpdateProduct },
}

impl ProductSubmission {
    /// Shown when the backend rejects the write without a message.
    pub fn fallback_error(&self) -> &'static str {
        match self {
            Self::Create(_) => "Failed to create product",
            Self::Update { .. } => "Failed to update product",
        }
    }
}

/// Create/edit dialog state.
#[derive(Debug, Clone)]
pub struct ProductForm {
    mode: ProductFormMode,
    pub name: TextInput,
    pub description: TextInput,
    pub price: TextInput,
    pub stock: TextInput,
    pub focus: ProductField,
    pending: bool,
    error: Option<FormError>,
}

impl ProductForm {
    /// Empty form: no description, stock 0.
    pub fn create() -> Self {
        Self {
            mode: ProductFormMode::Create,
            name: TextInput::default(),
            description: TextInput::default(),
            price: TextInput::default(),
            stock: TextInput::new("0"),
            focus: ProductField::Name,
            pending: false,
            error: None,
        }
    }

    /// Prefilled from `product`; a null description edits as empty text.
    pub fn edit(product: &Product) -> Self {
        Self {
            mode: ProductFormMode::Edit {
                id: product.id.clone(),
            },
            name: TextInput::new(product.name.as_str()),
            description: TextInput::new(product.description.as_deref().unwrap_or_default()),
            price: TextInput::new(product.price.as_str()),
            stock: TextInput::new(product.stock.to_string()),
            focus: ProductField::Name,
            pending: false,
            error: None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            ProductFormMode::Create => "Create Product",
            ProductFormMode::Edit { .. } => "Edit Product",
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    pub fn field(&self, field: ProductField) -> &TextInput {
        match field {
            ProductField::Name => &self.name,
            ProductField::Description => &self.description,
            ProductField::Price => &self.price,
            ProductField::Stock => &self.stock,
        }
    }

    fn active(&mut self) -> &mut TextInput {
        match self.focus {
            ProductField::Name => &mut self.name,
            ProductField::Description => &mut self.description,
            ProductField::Price => &mut self.price,
            ProductField::Stock => &mut self.stock,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn input(&mut self, c: char) {
        if self.pending {
            return;
        }
        // Stock is an integer field; reject anything that can't be part of one.
        if self.focus == ProductField::Stock && !(c.is_ascii_digit() || c == '-') {
            return;
        }
        self.active().push(c);
    }

    pub fn paste(&mut self, text: &str) {
        if !self.pending {
            self.active().paste(text);
        }
    }

    pub fn backspace(&mut self) {
        if !self.pending {
            self.active().backspace();
        }
    }

    /// Validate and mark pending. Every field is sent on edit, the way
    /// the form shows them, so an emptied description becomes `""`.
    pub fn submit(&mut self) -> Option<ProductSubmission> {
        if self.pending {
            return None;
        }
        self.error = None;

        if self.name.is_blank() || self.price.is_blank() {
            self.error = Some(FormError::local(PRODUCT_REQUIRED));
            return None;
        }
        let stock = if self.stock.is_blank() {
            0
        } else if let Ok(n) = self.stock.value().trim().parse::<i32>() {
            n
        } else {
            self.error = Some(FormError::local(STOCK_NOT_A_NUMBER));
            return None;
        };

        let name = self.name.value().trim().to_owned();
        let description = self.description.value().to_owned();
        let price = self.price.value().trim().to_owned();

        let submission = match &self.mode {
            ProductFormMode::Create => ProductSubmission::Create(CreateProduct {
                name,
                description: Some(description),
                price,
                stock,
            }),
            ProductFormMode::Edit { id } => ProductSubmission::Update {
                id: id.clone(),
                update: UpdateProduct {
                    name: Some(name),
                    description: Some(description),
                    price: Some(price),
                    stock: Some(stock),
                },
            },
        };
        self.pending = true;
        Some(submission)
    }

    pub fn fail(&mut self, error: FormError) {
        self.pending = false;
        self.error = Some(error);
    }
}
