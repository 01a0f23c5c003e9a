diesel::table! {
    #[sql_name = "Resources"]
    resources (resource_id) {
        #[sql_name = "resourceId"]
        resource_id -> BigInt,
        title -> Nullable<Text>,
        #[sql_name = "dateExpression"]
        date_expression -> Nullable<Text>,
        #[sql_name = "dateBegin"]
        date_begin -> Nullable<Integer>,
        #[sql_name = "dateEnd"]
        date_end -> Nullable<Integer>,
        #[sql_name = "resourceIdentifier1"]
        identifier -> Nullable<Text>,
        #[sql_name = "resourceLevel"]
        resource_level -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "ResourcesComponents"]
    resource_components (resource_component_id) {
        #[sql_name = "resourceComponentId"]
        resource_component_id -> BigInt,
        #[sql_name = "resourceId"]
        resource_id -> Nullable<BigInt>,
        #[sql_name = "parentResourceComponentId"]
        parent_resource_component_id -> Nullable<BigInt>,
        title -> Nullable<Text>,
        #[sql_name = "dateExpression"]
        date_expression -> Nullable<Text>,
        #[sql_name = "dateBegin"]
        date_begin -> Nullable<Integer>,
        #[sql_name = "dateEnd"]
        date_end -> Nullable<Integer>,
        #[sql_name = "persistentID"]
        persistent_id -> Nullable<Text>,
        #[sql_name = "resourceLevel"]
        resource_level -> Nullable<Text>,
    }
}

diesel::table! {
    #[sql_name = "ArchDescriptionInstances"]
    instances (instance_id) {
        #[sql_name = "archDescriptionInstancesId"]
        instance_id -> BigInt,
        #[sql_name = "instanceDescriminator"]
        instance_descriminator -> Text,
        #[sql_name = "instanceType"]
        instance_type -> Text,
        #[sql_name = "resourceId"]
        resource_id -> Nullable<BigInt>,
        #[sql_name = "resourceComponentId"]
        resource_component_id -> Nullable<BigInt>,
    }
}

diesel::table! {
    #[sql_name = "DigitalObjects"]
    digital_objects (digital_object_id) {
        #[sql_name = "digitalObjectId"]
        digital_object_id -> BigInt,
        version -> Integer,
        #[sql_name = "lastUpdated"]
        last_updated -> Text,
        created -> Text,
        #[sql_name = "lastUpdatedBy"]
        last_updated_by -> Text,
        #[sql_name = "createdBy"]
        created_by -> Text,
        title -> Text,
        #[sql_name = "dateExpression"]
        date_expression -> Nullable<Text>,
        #[sql_name = "dateBegin"]
        date_begin -> Nullable<Integer>,
        #[sql_name = "dateEnd"]
        date_end -> Nullable<Integer>,
        #[sql_name = "languageCode"]
        language_code -> Text,
        #[sql_name = "restrictionsApply"]
        restrictions_apply -> Bool,
        #[sql_name = "eadDaoActuate"]
        ead_dao_actuate -> Text,
        #[sql_name = "eadDaoShow"]
        ead_dao_show -> Text,
        #[sql_name = "metsIdentifier"]
        mets_identifier -> Text,
        #[sql_name = "objectType"]
        object_type -> Text,
        label -> Text,
        #[sql_name = "objectOrder"]
        object_order -> Integer,
        #[sql_name = "archDescriptionInstancesId"]
        instance_id -> BigInt,
        #[sql_name = "repositoryId"]
        repository_id -> BigInt,
    }
}

diesel::table! {
    #[sql_name = "FileVersions"]
    file_versions (file_version_id) {
        #[sql_name = "fileVersionId"]
        file_version_id -> BigInt,
        version -> Integer,
        #[sql_name = "lastUpdated"]
        last_updated -> Text,
        created -> Text,
        #[sql_name = "lastUpdatedBy"]
        last_updated_by -> Text,
        #[sql_name = "createdBy"]
        created_by -> Text,
        uri -> Text,
        #[sql_name = "useStatement"]
        use_statement -> Text,
        #[sql_name = "sequenceNumber"]
        sequence_number -> Integer,
        #[sql_name = "eadDaoActuate"]
        ead_dao_actuate -> Text,
        #[sql_name = "eadDaoShow"]
        ead_dao_show -> Text,
        #[sql_name = "digitalObjectId"]
        digital_object_id -> BigInt,
    }
}

diesel::table! {
    #[sql_name = "ArchDescriptionRepeatingData"]
    repeating_data (repeating_data_id) {
        #[sql_name = "archDescriptionRepeatingDataId"]
        repeating_data_id -> BigInt,
        descriminator -> Text,
        version -> Integer,
        #[sql_name = "lastUpdated"]
        last_updated -> Text,
        created -> Text,
        #[sql_name = "lastUpdatedBy"]
        last_updated_by -> Text,
        #[sql_name = "createdBy"]
        created_by -> Text,
        #[sql_name = "repeatingDataType"]
        repeating_data_type -> Text,
        title -> Text,
        #[sql_name = "sequenceNumber"]
        sequence_number -> Integer,
        #[sql_name = "resourceId"]
        resource_id -> Nullable<BigInt>,
        #[sql_name = "resourceComponentId"]
        resource_component_id -> Nullable<BigInt>,
        #[sql_name = "digitalObjectId"]
        digital_object_id -> Nullable<BigInt>,
        #[sql_name = "noteContent"]
        note_content -> Nullable<Text>,
        #[sql_name = "notesEtcTypeId"]
        notes_etc_type_id -> Nullable<Integer>,
    }
}

diesel::table! {
    #[sql_name = "Repositories"]
    repositories (repository_id) {
        #[sql_name = "repositoryId"]
        repository_id -> BigInt,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    resources,
    resource_components,
    instances,
    digital_objects,
    file_versions,
    repeating_data,
    repositories,
);
