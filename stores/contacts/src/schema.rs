table! {
    contacts (id) {
        id -> Int4,
        name -> Varchar,
        email -> Varchar,
        message -> Text,
        created_at -> Timestamptz,
    }
}
