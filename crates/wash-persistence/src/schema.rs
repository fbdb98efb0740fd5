// Esquema Diesel de las tablas del controlador de lavados.
// Las fechas se guardan como milisegundos UTC en columnas `_ts`.
use diesel::allow_tables_to_appear_in_same_query;
diesel::table! {
    wash_cycles (id) {
        id -> BigInt,
        machine_id -> SmallInt,
        start_user_id -> Integer,
        end_user_id -> Nullable<Integer>,
        started_at_ts -> BigInt,
        ended_at_ts -> Nullable<BigInt>,
        status -> Text,
        start_observation -> Nullable<Text>,
        finish_observation -> Nullable<Text>,
    }
}
diesel::table! {
    prots (wash_id, prot_id, batch_number, bag_number) {
        wash_id -> BigInt,
        prot_id -> Text,
        batch_number -> Text,
        bag_number -> Text,
        position -> Integer,
    }
}
diesel::table! {
    photos (wash_id, sequence) {
        wash_id -> BigInt,
        sequence -> Integer,
        file_name -> Text,
        file_path -> Text,
        content_type -> Text,
        size_bytes -> BigInt,
        checksum -> Text,
        description -> Nullable<Text>,
        created_at_ts -> BigInt,
    }
}
diesel::table! {
    machines (id) {
        id -> SmallInt,
        name -> Text,
    }
}
diesel::table! {
    users (id) {
        id -> Integer,
        user_name -> Text,
        role -> Text,
        active -> Bool,
    }
}
diesel::table! {
    parameters (name) {
        name -> Text,
        value -> Text,
    }
}
diesel::joinable!(prots -> wash_cycles (wash_id));
diesel::joinable!(photos -> wash_cycles (wash_id));
allow_tables_to_appear_in_same_query!(wash_cycles, prots, photos, machines, users, parameters);
